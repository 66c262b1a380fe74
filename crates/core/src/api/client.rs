//! HTTP client for room and role lookup

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, Response};
use std::time::Duration;

use super::types::*;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::room::Role;
use crate::rules::Color;

pub const SESSION_COOKIE: &str = "sessionid";

pub struct RoomClient {
    client: Client,
    config: ClientConfig,
}

impl RoomClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let cookie = format!("{}={}", SESSION_COOKIE, self.config.session);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.insert(COOKIE, value);
        }

        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/chess/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Error::Api(format!(
            "{} failed: {} - {}",
            what,
            response.status(),
            response.text().await.unwrap_or_default()
        )))
    }

    /// Fetch a room, creating it server-side if it does not exist yet
    pub async fn get_room(&self, room_id: u32) -> Result<RoomInfo> {
        let response = self.client
            .get(self.url(&format!("rooms/{}", room_id)))
            .headers(self.headers())
            .send()
            .await?;

        let room: RoomInfo = Self::ensure_success(response, "room lookup").await?.json().await?;
        Ok(room)
    }

    /// Role of this client's session in a room
    pub async fn get_role(&self, room_id: u32) -> Result<Role> {
        let response = self.client
            .get(self.url("role"))
            .headers(self.headers())
            .query(&[("room_id", room_id.to_string())])
            .send()
            .await?;

        let role: RoleResponse = Self::ensure_success(response, "role lookup").await?.json().await?;
        Ok(role.role)
    }

    /// Claim a color in a room
    pub async fn register(&self, room_id: u32, color: Color) -> Result<()> {
        let response = self.client
            .post(self.url("role"))
            .headers(self.headers())
            .query(&[("room_id", room_id.to_string()), ("color", color.as_str().to_string())])
            .send()
            .await?;

        Self::ensure_success(response, "role registration").await?;
        tracing::info!(room_id, %color, "registered for room");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RoomClient {
        RoomClient::new(ClientConfig {
            api_base: "http://localhost:8000/".to_string(),
            ws_base: "ws://localhost:8000".to_string(),
            session: "abc123".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(client.url("rooms/5"), "http://localhost:8000/api/chess/rooms/5");
        assert_eq!(client.url("role"), "http://localhost:8000/api/chess/role");
    }

    #[test]
    fn test_session_cookie_header() {
        let headers = client().headers();
        assert_eq!(headers.get(COOKIE).unwrap(), "sessionid=abc123");
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_http_error() {
        let client = RoomClient::new(ClientConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            ws_base: "ws://127.0.0.1:9".to_string(),
            session: "s".to_string(),
        })
        .unwrap();

        assert!(matches!(client.get_room(1).await, Err(Error::Http(_))));
    }
}

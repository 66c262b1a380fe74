//! Environment-driven settings for the room server and its clients

use std::env;

use crate::rules::{CheckScan, RookInteract, RuleSet};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DB: &str = "chess_rooms.db";

/// Server settings. Read with [`Settings::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub database_path: String,
    pub rules: RuleSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            database_path: DEFAULT_DB.to_string(),
            rules: RuleSet::default(),
        }
    }
}

impl Settings {
    /// Reads `CHESS_ROOMS_ADDR`, `CHESS_ROOMS_DB`, `CHESS_ROOMS_ROOK_CAPTURE`,
    /// `CHESS_ROOMS_TRANSIT_CHECK`, `CHESS_ROOMS_CASTLE_MARKS_MOVED` and
    /// `CHESS_ROOMS_CHECK_SCAN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let rook_interact = match lookup("CHESS_ROOMS_ROOK_CAPTURE").as_deref().map(parse_flag) {
            Some(true) => RookInteract::Capture,
            _ => RookInteract::SwapOnly,
        };

        let check_scan = match lookup("CHESS_ROOMS_CHECK_SCAN").as_deref() {
            Some("threatened") => CheckScan::Threatened,
            Some("attackable") | None => CheckScan::Attackable,
            Some(other) => {
                tracing::warn!("unknown CHESS_ROOMS_CHECK_SCAN value '{}', using attackable", other);
                CheckScan::Attackable
            }
        };

        Self {
            bind_addr: lookup("CHESS_ROOMS_ADDR").unwrap_or(defaults.bind_addr),
            database_path: lookup("CHESS_ROOMS_DB").unwrap_or(defaults.database_path),
            rules: RuleSet {
                rook_interact,
                castling_transit_check: lookup("CHESS_ROOMS_TRANSIT_CHECK")
                    .as_deref()
                    .is_some_and(parse_flag),
                castling_marks_moved: lookup("CHESS_ROOMS_CASTLE_MARKS_MOVED")
                    .as_deref()
                    .is_some_and(parse_flag),
                check_scan,
            },
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Where a client finds the room server and how it identifies itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// e.g. `http://localhost:8000`
    pub api_base: String,
    /// e.g. `ws://localhost:8000`
    pub ws_base: String,
    /// Value of the `sessionid` cookie.
    pub session: String,
}

impl ClientConfig {
    /// Points both bases at `host` (`"localhost:8000"`) with a fresh session.
    pub fn for_host(host: &str) -> Self {
        Self {
            api_base: format!("http://{}", host),
            ws_base: format!("ws://{}", host),
            session: new_session_key(),
        }
    }
}

/// Random 32-character alphanumeric session key.
pub fn new_session_key() -> String {
    use rand::distr::Alphanumeric;
    use rand::Rng;

    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind_addr, "127.0.0.1:8000");
    }

    #[test]
    fn test_rule_flags_from_env() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("CHESS_ROOMS_ROOK_CAPTURE", "true"),
            ("CHESS_ROOMS_TRANSIT_CHECK", "1"),
            ("CHESS_ROOMS_CASTLE_MARKS_MOVED", "on"),
            ("CHESS_ROOMS_CHECK_SCAN", "threatened"),
            ("CHESS_ROOMS_DB", ":memory:"),
        ]));

        assert_eq!(settings.rules, RuleSet::strict());
        assert_eq!(settings.database_path, ":memory:");
    }

    #[test]
    fn test_unknown_scan_falls_back() {
        let settings = Settings::from_lookup(lookup_from(&[("CHESS_ROOMS_CHECK_SCAN", "sideways")]));
        assert_eq!(settings.rules.check_scan, CheckScan::Attackable);
    }

    #[test]
    fn test_client_config_for_host() {
        let config = ClientConfig::for_host("localhost:8000");
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.ws_base, "ws://localhost:8000");
        assert_eq!(config.session.len(), 32);
        assert_ne!(config.session, new_session_key());
    }
}

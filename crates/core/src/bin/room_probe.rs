//! Fetch a room from a running server and print its board

use chess_rooms_core::rules::notation;
use chess_rooms_core::{ClientConfig, RoomClient, RuleSet};

#[tokio::main]
async fn main() {
    let room_id: u32 = match std::env::args().nth(1).map(|arg| arg.parse()) {
        Some(Ok(id)) => id,
        _ => {
            eprintln!("Usage: room_probe <room_id> [host:port]");
            std::process::exit(1);
        }
    };
    let host = std::env::args().nth(2).unwrap_or_else(|| "localhost:8000".to_string());

    println!("Fetching room {} from {}", room_id, host);

    let client = match RoomClient::new(ClientConfig::for_host(&host)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            std::process::exit(1);
        }
    };

    let room = match client.get_room(room_id).await {
        Ok(room) => room,
        Err(e) => {
            eprintln!("Failed to fetch room: {}", e);
            std::process::exit(1);
        }
    };

    println!("Last accessed: {}", room.last_accessed);
    println!("To move: {}", room.turn);
    let open: Vec<String> = room.open_colors().iter().map(|c| c.to_string()).collect();
    println!("Open seats: {}", if open.is_empty() { "none".to_string() } else { open.join(", ") });

    match room.to_board(RuleSet::default()) {
        Ok(board) => {
            println!();
            print!("{}", notation::render(&board));
            println!();
            println!("FEN: {}", notation::board_fen(&board));
        }
        Err(e) => {
            eprintln!("Room holds an invalid board: {}", e);
            std::process::exit(1);
        }
    }

    match client.get_role(room_id).await {
        Ok(role) => println!("Our role: {}", role),
        Err(e) => eprintln!("Failed to get role: {}", e),
    }
}

// Server loop module
// Accepts connections and hands each one to its own task

use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::handle_connection;
use crate::config::AppState;
use crate::logger;

/// Accept connections forever
///
/// Accept errors (e.g. file descriptor exhaustion) are logged and the loop
/// keeps going.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => handle_connection(stream, peer_addr, Arc::clone(&state)),
            Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
        }
    }
}

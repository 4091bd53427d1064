// Server module entry point
// Provides listener binding and the connection accept loop

pub mod connection;
pub mod listener;

// Rust 不允许 loop 作为模块名（关键字），改用 server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::{bind_with_fallback, create_listener};
pub use server_loop::start_server_loop;

//! Request handler module
//!
//! Maps one request to one response: directory listings, file serving and
//! the upload endpoint.

pub mod listing;
pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;

//! fserver: a small static file server
//!
//! Serves a directory tree over HTTP/1.1 with HTML directory listings,
//! `Last-Modified`/`ETag` validators, single byte ranges, gzip/deflate
//! compression and a multipart upload endpoint.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod templates;

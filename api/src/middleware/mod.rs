//! Request-level helpers: CORS policy and client address extraction

pub mod client_ip;
pub mod cors;

pub use client_ip::client_ip;
pub use cors::create_cors;

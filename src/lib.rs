//! Messaging API: users register and log in with passwords, exchange text
//! messages, and can only read or mark-read messages they take part in.
//!
//! - [`crypto`] hashes passwords and signs bearer tokens
//! - [`db`] holds the user directory and message store
//! - [`api`] resolves caller identity and serves the HTTP routes

pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;

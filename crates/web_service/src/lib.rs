//! HTTP surface of the chat relay.
//!
//! Routes, CORS allow-listing, per-client throttling and the mapping from
//! domain outcomes to the localized response bodies the widget expects.

pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod server;

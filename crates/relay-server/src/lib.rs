//! Relay server library - HTTP/WebSocket front end for the relay core.
//!
//! Separated from main.rs so the router can be driven from integration tests.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
pub mod websocket;

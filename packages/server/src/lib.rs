//! Watch-party synchronization relay.
//!
//! Keeps every participant's player position, play/pause state, playback rate
//! and room membership consistent over WebSocket.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

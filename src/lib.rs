//! ctm-bot - chat command bot for the Classic Tetris Monthly community.
//!
//! Routes `!pb`, `!setpb` and friends from Discord and Twitch chat through a
//! platform-agnostic command layer backed by SQLite.

pub mod bot;
pub mod commands;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod network;
pub mod platform;
pub mod scores;
pub mod telemetry;

#[cfg(test)]
mod testing;

//! Integration test common infrastructure.

pub mod irc;

#[allow(unused_imports)]
pub use irc::FakeIrcServer;

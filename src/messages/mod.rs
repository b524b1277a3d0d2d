//! Message types exchanged with the state actor.

pub mod commands;

pub use commands::StateCommand;

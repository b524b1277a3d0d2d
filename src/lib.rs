//! # MUSE state
//!
//! Path-addressed reactive state store shared by the controllers of the
//! MUSE/VRGame presentation system.
//!
//! ## Features
//! - Nested value tree addressed by dotted paths (`program.stages`)
//! - Deep-copy reads, deep-equality change detection on writes
//! - Listeners on a path also hear about writes below it
//! - Force dispatch to re-broadcast an unchanged value
//! - Show config seeding (YAML/JSON)
//!
//! ## Architecture
//! - `AppState` - single-owner store, synchronous notification
//! - `StateActor` - owns the store on a multi-threaded host
//! - `StateHandle` - clonable async access to the actor

pub mod path;
pub mod models;
pub mod host;
pub mod messages;
pub mod app;
pub mod config;
pub mod console;
pub mod constants;

// Re-export commonly used types
pub use path::StatePath;
pub use models::{ShowConfig, StateChange, SubscriptionId};
pub use host::{Host, NoopHost};
pub use messages::StateCommand;
pub use app::{AppState, StateActor, StateHandle};
pub use console::{parse_command, ConsoleCommand};

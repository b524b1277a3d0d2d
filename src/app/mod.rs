//! App layer - the reactive store and the actor that owns it
//!
//! `AppState` is single-owner and notifies synchronously. On a multi-threaded
//! host, the `StateActor` owns it and `StateHandle`s talk to it over channels.

pub mod state;
pub mod registry;
pub mod actor;
pub mod handle;

pub use state::AppState;
pub use actor::StateActor;
pub use handle::StateHandle;

//! wardend - moderation and engagement automation for community chat servers.
//!
//! The core is an event-driven workflow engine: persisted state machines
//! (message counters, strike ledger, suggestion board, ticket desk) behind an
//! access gate, reacting to platform events and emitting side-effect commands
//! for a thin adapter layer to execute.

pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod gate;
pub mod platform;
pub mod store;
pub mod workflows;

pub use config::Config;
pub use engine::Engine;
pub use error::WorkflowError;
pub use store::Store;

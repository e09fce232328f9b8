//! The planning workflow: state, routing, synthesis and the loop that drives them.

pub mod coordinator;
pub mod retry;
pub mod router;
pub mod state;
pub mod synthesizer;

pub use coordinator::Coordinator;

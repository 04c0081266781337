//! Listener and routing

pub mod listener;
pub mod router;

pub use router::Router;

//! synth-history — rolling history of verification outcomes.
//!
//! The only mutable state shared between the pipeline workers and the
//! HTTP surface. One mutex guards the sequence; it is held for a single
//! append or a single snapshot copy and never across an `.await`.

pub mod store;

pub use store::{DEFAULT_CAPACITY, History};

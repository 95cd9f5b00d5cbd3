//! Infrastructure layer
//!
//! Concrete implementations of the domain storage traits.

pub mod graph;

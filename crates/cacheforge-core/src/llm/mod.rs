//! Generation service abstraction.

pub mod provider;

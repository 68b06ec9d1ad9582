//! Schema derivation
//!
//! Builds an ordered output schema from declared fields by running the
//! type projector per field, then applying destination policy: marker
//! renaming, field reordering and collision detection.

mod builder;

pub use builder::SchemaBuilder;

#[cfg(test)]
mod tests;

//! Type projection
//!
//! Maps a cursor-side value and declared type to a supported output
//! type, handling nullability, sequences, opaque and enumerated domain
//! objects, and failing fast on anything the engine cannot represent.

mod projector;

pub use projector::{project, project_type, project_value};

//! Domain layer.
//!
//! - `foundation` - Error taxonomy and identifiers
//! - `wizard` - Step graph, journey state and the step pipeline

pub mod foundation;
pub mod wizard;

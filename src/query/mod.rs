//! Query execution: validation, hint delegation and result normalisation.
mod executor;
mod hints;
mod normalize;

pub use executor::*;
pub use hints::*;
pub use normalize::*;

pub mod category;
pub mod compiler;
pub mod query;
pub mod matcher;
pub mod location;

pub use category::*;
pub use compiler::*;
pub use query::*;
pub use matcher::*;
pub use location::{LocationClassifier, normalize as normalize_location};

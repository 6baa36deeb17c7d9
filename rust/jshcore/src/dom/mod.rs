pub mod page;
pub mod selector;
pub mod document;

pub use page::*;
pub use selector::{Selector, SelectorError};
pub use document::{Document, NodeId};

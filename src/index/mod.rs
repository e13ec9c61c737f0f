//! The index collaborator interface and an in-memory reference index.

pub mod adapter;
pub mod memory;

pub use adapter::{Index, TermVector};
pub use memory::InMemIndex;

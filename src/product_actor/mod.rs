//! Catalog store: the product collection managed by a resource actor.

pub mod entity;
pub mod sequence;

pub use sequence::ProductIdSequence;

//! Cart collection managed by a resource actor.

pub mod entity;

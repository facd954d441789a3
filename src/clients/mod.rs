//! Typed clients wrapping the resource actors: the mutation gateway for the
//! catalog and the cart allocator.

mod cart_allocator;
mod mutation_gateway;

pub use cart_allocator::CartAllocator;
pub use mutation_gateway::{MutationGateway, MutationIntent};

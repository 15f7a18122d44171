//! Storage module for file management
//!
//! Provides the local filesystem blob store and the partitioning strategy
//! that decides which directory a new blob lands in.

mod blob_store;
mod location;
#[cfg(test)]
mod memory;

pub use blob_store::{BlobError, BlobReader, BlobStore, LocalBlobStore};
#[cfg(test)]
pub use location::FixedLocation;
pub use location::{DatePartition, LocationStrategy};
#[cfg(test)]
pub use memory::MemoryBlobStore;

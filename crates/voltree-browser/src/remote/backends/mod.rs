//! Remote file API implementations.

mod local;
mod memory;

pub use local::LocalRemote;
pub use memory::{MemoryRemote, RemoteCall};

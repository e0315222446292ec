//! Remote file API seam.
//!
//! - [`RemoteFs`] - the request/response API the browser consumes
//! - [`MemoryRemote`] - in-memory volumes (tests, demos), with fault injection
//! - [`LocalRemote`] - serves volumes from host directories by mount prefix

pub mod backends;
mod error;
mod ops;

pub use backends::{LocalRemote, MemoryRemote, RemoteCall};
pub use error::{RemoteError, RemoteResult};
pub use ops::RemoteFs;

//! Shared types for voltree.
//!
//! A leaf crate with no internal dependencies. It defines the vocabulary
//! the browser core and the remote backends agree on:
//!
//! | Type              | Purpose                                       |
//! |-------------------|-----------------------------------------------|
//! | [`VirtualPath`]   | Normalized absolute path in the unified tree  |
//! | [`DirEntry`]      | One listing row (remote or synthetic)         |
//! | [`EntryKind`]     | File or directory                             |
//! | [`VolumeMount`]   | A container volume exposed at a fixed path    |
//! | [`ServerId`]      | Which game server the browser is attached to  |
//!
//! Path helpers live in [`path`] and are pure functions over `&str`.

pub mod entry;
pub mod mount;
pub mod path;
mod server;

pub use entry::{DirEntry, EntryKind};
pub use mount::VolumeMount;
pub use path::VirtualPath;
pub use server::ServerId;

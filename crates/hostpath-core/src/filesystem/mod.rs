//! Filesystem primitives backing provisioned volumes.
//!
//! Volume directories are the only persisted state: their existence and
//! permission bits. There is no metadata file or index.

pub mod directory;
pub mod space;

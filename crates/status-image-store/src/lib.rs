//! Status image store
//!
//! Keeps one JPEG per HTTP status code in a flat directory. There is no
//! in-memory index: every lookup goes to the filesystem.

mod error;
mod key;
mod store;

pub use error::{Result, StoreError};
pub use key::{InvalidKey, StatusKey};
pub use store::ImageStore;

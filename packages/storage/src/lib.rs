//! # Quill Storage
//!
//! Persistence collaborators for the editor history engine.
//!
//! Two stores with one contract (`load` / `save`), different profiles:
//!
//! ```text
//! LocalCache   sync, cheap, one HistoryState per user   (crash/reload durability)
//! RemoteStore  async, slow, one Snapshot per user       (authoritative backup)
//! ```
//!
//! "Not found" is `Ok(None)`, never an error.

pub mod error;
pub mod local;
pub mod model;
pub mod remote;
pub mod result;

pub use error::*;
pub use local::*;
pub use model::*;
pub use remote::*;
pub use result::*;

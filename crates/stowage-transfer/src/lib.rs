//! Stowage Transfer Library
//!
//! Moves artifacts between the local filesystem (or a remote agent) and object
//! storage. One call transfers one file to or from one resolved `Destination`
//! and returns a `TransferRecord`. Calls share no state, so a caller may run
//! many of them concurrently against one storage client.

pub mod engine;
pub mod error;
pub mod file;
pub mod http;
pub mod metadata;
pub mod staging;

pub use engine::{TransferEngine, UploadOptions};
pub use error::{TransferError, TransferResult};
pub use file::{ArtifactFile, LocalArtifactFile};
pub use http::HttpArtifactFile;
pub use metadata::{build_metadata, parse_expires};

//! Data models for artifact transfers
//!
//! Value types that flow between the destination resolver, the transfer
//! engine and whoever aggregates the resulting records.

mod destination;
mod entry;
mod job;
mod management;
mod metadata;
mod record;
mod storage_class;

pub use destination::*;
pub use entry::*;
pub use job::*;
pub use management::*;
pub use metadata::*;
pub use record::*;
pub use storage_class::*;

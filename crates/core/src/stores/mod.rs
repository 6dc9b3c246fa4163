//! HTTP-backed implementations of the storage and record traits.

mod records;
mod storage;

pub use records::RestRecordStore;
pub use storage::BucketStore;

//! Adapters implementing domain ports.
//!
//! Infrastructure implementations of the traits in [`crate::ports`], plus
//! the CSV table exporter.

pub mod csv_export;
pub mod in_memory_repository;
pub mod msgpack_repository;

pub use csv_export::{CsvExporter, ExportSummary};
pub use in_memory_repository::InMemoryRepository;
pub use msgpack_repository::MsgPackRepository;

//! Storage layer for coldwatch.
//!
//! Defines the [`TelemetryStore`] trait every backend implements, the
//! insert-record types, the storage error type, and the in-memory backend
//! used by the server and the test suites.

mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{DeviceLease, MemoryStore};
pub use record::{DashboardCounts, NewAssignment, NewIncident, NewReading};
pub use traits::TelemetryStore;

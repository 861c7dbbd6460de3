//! Business workflows for coldwatch.
//!
//! The ingestion pipeline and the incident lifecycle are the two
//! invariant-bearing workflows in the system; the rate limiter is the
//! pipeline's admission gate, and the session flow ties the credential
//! store to the token service. Every operation takes the authenticated
//! [`Principal`](coldwatch_auth::Principal) as an explicit argument.

mod identity;
mod incidents;
mod ingest;
mod rate_limit;
mod sessions;

pub use identity::resolve_device_key;
pub use incidents::{CreateIncident, IncidentLifecycle};
pub use ingest::{IngestOutcome, IngestRequest, IngestionPipeline};
pub use rate_limit::RateLimiter;
pub use sessions::SessionFlow;

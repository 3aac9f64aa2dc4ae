//! obswatch core library.
//!
//! Client for the Open Build Service REST API, scoped to one workflow:
//! trigger a service remote run for a package, then poll the project's
//! aggregate build status until every repository is published or a
//! package has failed.

pub mod client;
pub mod error;
pub mod report;
pub mod status;
pub mod telemetry;

pub use client::{ObsClient, ObsConfig, DEFAULT_API_URL};
pub use error::{ObsError, Result};
pub use report::{parse_summary, ResultRecord};
pub use status::{reduce, AggregateStatus, BuildState};
pub use telemetry::init_tracing;

//! HTTP service and command line front end for the health insight pipeline.
//!
//! `health-insights-server` accepts CSV uploads, stores a processed record
//! per upload and serves summaries, trends, anomalies and insights for it.
//! `health-insights` analyzes a single file from the command line.

pub mod cli;
pub mod config;
pub mod csv_input;
pub mod error;
pub mod processing;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use processing::{UploadRecord, process_upload};
pub use routes::build_router;
pub use state::AppState;
pub use store::{InMemoryRecordStore, RecordStore};

//! Facto Query & Verification API
//!
//! Stateless read plane over the event projections: time-window and point
//! lookups, session walks, single-event and whole-chain verification, and
//! evidence-package export with Merkle inclusion proofs.

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{create_server, run_server};
pub use state::{ApiConfig, AppState};

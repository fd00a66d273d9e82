//! # Custos Core
//!
//! Domain layer for the custos user-management service: the user and audit
//! models, the error taxonomy shared across crates, the uniform JSON response
//! envelope, and the ports (traits) the server crate's storage and pub/sub
//! adapters implement.

pub mod api_types;
pub mod audit;
pub mod error;
pub mod ports;
pub mod user;

pub use api_types::{ApiResponse, Pagination};
pub use audit::{AuditEvent, AuditEventKind};
pub use error::{CoreError, Result};
pub use user::{User, Validate};

//! # Custos Server
//!
//! User-management HTTP service built on Axum:
//!
//! - **Sessions**: stateless HS256 access/refresh token pairs with rotation
//! - **User CRUD**: Postgres-backed accounts with search and pagination
//! - **Audit trail**: read/write activity published fire-and-forget over
//!   Redis pub/sub and persisted by an independent consumer task

pub mod audit;
pub mod auth;
pub mod db;
pub mod errors;
pub mod extract;
pub mod infra;
pub mod routes;
pub mod users;

pub use infra::app_state::AppState;
pub use routes::create_app;

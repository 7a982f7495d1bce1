//! # reefhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON control API** for macros (`/api/macros`), timer jobs
//!   (`/api/timers`) and every registered subsystem (`/api/subsystems`)
//! - Start macro runs and reverts without waiting for them to finish
//! - Map application errors into HTTP status codes and `{ "error": … }` bodies
//!
//! ## Dependency rule
//! Depends on `reefhub-app` (services and the subsystem registry) and
//! `reefhub-domain` (request/response types). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

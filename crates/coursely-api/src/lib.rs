//! Coursely API
//!
//! HTTP handlers, edge middleware, authentication and application setup for the
//! `coursely-api` binary.

mod api_doc;
mod handlers;
mod utils;

pub mod auth;
pub mod error;
pub mod middleware;
pub mod setup;
pub mod state;

pub use auth::{Authenticator, CurrentUser};
pub use error::{HttpAppError, ValidatedJson};
pub use state::AppState;

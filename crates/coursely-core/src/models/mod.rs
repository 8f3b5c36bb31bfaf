//! Data models for the platform
//!
//! Each sub-module covers one feature area. Row types derive `sqlx::FromRow` behind the
//! `sqlx` feature; request/response types derive `ToSchema` for the OpenAPI document.

mod analytics;
mod certificate;
mod course;
mod invoice;
mod live_class;
mod payment;
mod subscription;
mod tenant;
mod user;
mod webhook;
mod white_label;

pub use analytics::*;
pub use certificate::*;
pub use course::*;
pub use invoice::*;
pub use live_class::*;
pub use payment::*;
pub use subscription::*;
pub use tenant::*;
pub use user::*;
pub use webhook::*;
pub use white_label::*;

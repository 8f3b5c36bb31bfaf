//! Coursely Core Library
//!
//! Domain models, money helpers, error types and configuration shared by every
//! Coursely crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod money;
pub mod validation;

// Re-export commonly used types
pub use config::{
    AuthConfig, BaseConfig, CashfreeConfig, Config, GoogleMeetConfig, PlatformConfig,
    RateLimitConfig, RateLimitStoreKind, RazorpayConfig, ZoomConfig,
};
pub use error::{first_validation_message, AppError, ErrorMetadata, LogLevel};
pub use money::{derive_refund_status, payment_status_after_refunds, InvoiceTotals, TAX_RATE};

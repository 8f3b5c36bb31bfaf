//! Coursely Storage Library
//!
//! Blob storage for generated certificate PDFs and uploaded signature images.
//!
//! # Storage key format
//!
//! Keys are tenant-scoped. The default tenant (or a missing tenant) uses the short form:
//!
//! - certificates: `certificates/{certificate_number}.pdf` or
//!   `certificates/{tenant_id}/{certificate_number}.pdf`
//! - signatures: `signatures/{signature_id}.{ext}` or
//!   `signatures/{tenant_id}/{signature_id}.{ext}`
//!
//! Keys must not contain `..` or a leading `/`.

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::{certificate_key, signature_key};
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};

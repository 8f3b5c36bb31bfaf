//! Payment-order lifecycle persistence

pub mod invoice;
pub mod payment;
pub mod refund;
pub mod subscription;
pub mod webhook;

pub use invoice::{InvoiceRepository, InvoiceRepositoryTrait};
pub use payment::{PaymentRepository, PaymentRepositoryTrait};
pub use refund::{RefundRepository, RefundRepositoryTrait};
pub use subscription::{SubscriptionRepository, SubscriptionRepositoryTrait};
pub use webhook::{WebhookRecordRepository, WebhookRecordRepositoryTrait};

//! External gateway adapters
//!
//! Payment gateways (Razorpay, Cashfree) and meeting providers (Zoom, Google Meet) behind
//! two traits, so services never talk to a vendor API directly. The [`GatewayRegistry`]
//! holds whichever adapters have credentials configured.

pub mod error;
mod http;
pub mod meeting;
pub mod payment;
pub mod registry;
pub mod signature;

pub use error::{GatewayError, GatewayResult};
pub use meeting::{GoogleMeetProvider, Meeting, MeetingProvider, MeetingRequest, ZoomProvider};
pub use payment::{
    CashfreeGateway, GatewayEvent, GatewayOrder, GatewayRefund, OrderRequest, ParsedWebhook,
    PaymentGateway, RazorpayGateway, RefundRequest, VerificationRequest,
};
pub use registry::GatewayRegistry;

pub mod analytics;
pub mod auth_session;
pub mod certificates;
pub mod courses;
pub mod enrollments;
pub mod invoices;
pub mod live_classes;
pub mod pages;
pub mod payments;
pub mod subscriptions;
pub mod tenants;
pub mod webhooks;
pub mod white_label;

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// `limit`/`offset` query parameters for list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page size, 1-100 (default 20)
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn clamped(self) -> (i64, i64) {
        coursely_core::constants::clamp_pagination(self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub published: bool,
}

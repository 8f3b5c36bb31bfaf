//! Constants shared across crates.

/// Prefix under which the JSON API is mounted. Rate limiting applies only below it.
pub const API_PREFIX: &str = "/api";

/// Tenant seeded by the initial migration; identities without a tenant claim land here.
pub const DEFAULT_TENANT_ID: uuid::Uuid = uuid::Uuid::from_u128(0x00000000_0000_0000_0000_000000000001);

/// Session cookie name.
pub const SESSION_COOKIE: &str = "coursely_session";

/// Length of the public certificate verification code.
pub const VERIFICATION_CODE_LEN: usize = 12;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp client pagination input to sane bounds.
pub fn clamp_pagination(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

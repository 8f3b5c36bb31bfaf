//! Tenancy, local user mirror and white-label persistence

pub mod tenant;
pub mod user;
pub mod white_label;

pub use tenant::TenantRepository;
pub use user::{UserRepository, UserRepositoryTrait};
pub use white_label::WhiteLabelRepository;

//! Catalog, enrollment, certificate and live-class persistence

pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod live_class;

pub use certificate::{CertificateRepository, CertificateRepositoryTrait, IssuanceContext};
pub use course::{CourseRepository, CourseRepositoryTrait};
pub use enrollment::{EnrollmentRepository, EnrollmentRepositoryTrait};
pub use live_class::{CourseOwner, LiveClassRepository, LiveClassRepositoryTrait};

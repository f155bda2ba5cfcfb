pub mod activity_service;
pub mod catalog_service;
pub mod certificate_service;
pub mod lifecycle_service;
pub mod query_service;

pub use activity_service::ActivityService;
pub use catalog_service::CatalogService;
pub use certificate_service::CertificateService;
pub use lifecycle_service::LifecycleService;
pub use query_service::QueryService;

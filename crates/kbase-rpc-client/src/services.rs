//! Typed clients for KBase core services

pub mod search2;
pub mod service_wizard;

pub use search2::Search2LegacyClient;
pub use service_wizard::{GetServiceStatusParams, ServiceStatus, ServiceWizardClient};

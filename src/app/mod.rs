pub mod backend;
pub mod errors;
pub mod factory;
pub mod prompts;
pub mod remote;
pub mod service;

pub use backend::{AppBackend, RelevantListRequest, SummaryRequest, TagRequest};
pub use errors::AppError;
pub use factory::AppFactory;
pub use service::{CurationService, ServiceOptions};

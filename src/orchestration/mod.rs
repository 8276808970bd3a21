pub mod orchestrator;

pub use orchestrator::{MatrixReport, MatrixService, ServiceError};

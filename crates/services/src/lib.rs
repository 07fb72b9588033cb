#![forbid(unsafe_code)]

pub mod error;
pub mod scheduler_service;

pub use progress_core::Clock;

pub use error::SchedulerServiceError;
pub use scheduler_service::SchedulerService;

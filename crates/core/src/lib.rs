#![forbid(unsafe_code)]

//! Domain core for spaced-repetition review scheduling.
//!
//! Pure building blocks only: the grading engine and due-queue builder do no
//! I/O and take time as an explicit argument, so every scheduling decision is
//! reproducible from its inputs.

pub mod grading;
pub mod model;
pub mod queue;
pub mod time;

pub use grading::{GradeError, GradingEngine, GradingParams};
pub use queue::build_due_queue;
pub use time::Clock;

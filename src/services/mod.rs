//! Business logic services layer

pub mod etl_service;
pub mod transform;

pub use etl_service::{IterationOutcome, LoginEtlService, RunStats};

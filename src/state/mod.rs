//! State module for tracking job progress
//!
//! `JobState` is the lifecycle of one inbound job, and `FailureKind`
//! classifies why a job ended in the failure path.

mod job_state;

pub use job_state::{FailureKind, JobState};

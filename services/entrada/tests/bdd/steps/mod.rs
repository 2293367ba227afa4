//! BDD step definitions for entrada service

pub mod lifecycle_steps;
pub mod pipeline_steps;

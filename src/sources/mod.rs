//! Adapters for the external services that feed the calculator.
//!
//! Every adapter reports failures as [`crate::error::SourceError`] so the
//! caller can tell a rejected login from an unreachable host or an empty day.

pub mod employees;
pub mod rams;
pub mod retry;
pub mod timedoctor;

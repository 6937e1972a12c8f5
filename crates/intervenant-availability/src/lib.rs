//! Key-gated availability checks for external contributors ("intervenants").
//!
//! An intervenant receives a time-limited access key. Presenting that key yields their
//! availability record, which is then checked week by week against the engagement's
//! expected weeks and the minimum hours required for each of them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

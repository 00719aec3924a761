//! Faultbox - fault-injection control plane
//!
//! A registry of named failure scenarios that can be started, stopped and
//! inspected individually or as composite sessions with an automatic
//! recovery timer, served over a JSON HTTP API.

pub mod config;
pub mod manager;
pub mod rest;
pub mod scenarios;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

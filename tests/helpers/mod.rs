//! Test helper modules
//!
//! Shared infrastructure for the integration suites: a disposable Postgres
//! database and seed-data builders that drive the public services.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_data;

pub use database_helper::TestDatabase;
pub use test_data::*;

//! End-to-end tests against wiremock servers

mod download_tests;
mod mirror_tests;

//! Integration tests for eksi-export
//!
//! `export_tests` drives the full pipeline against a wiremock server;
//! `concurrency_tests` uses in-memory page sources to check ordering and
//! concurrency bounds.

mod concurrency_tests;
mod export_tests;

//! Unit tests for the public fact model API.

mod export_test;
mod identity_test;

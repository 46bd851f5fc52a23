//! Integration tests for the curfew CLI
//!
//! These tests spawn the actual binary against a throwaway config whose
//! backends write into a temp directory.

mod apps_command;
mod cli_tests;

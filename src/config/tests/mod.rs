//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `cli_loading`: Loading from command-line arguments
//! - `precedence`: Layer precedence tests
//! - `key_resolution`: API key fallbacks to provider-standard variables
//! - `provider_settings`: Conversion into provider and report settings

mod helpers;

//! Integration tests for Botmon Edge
//!
//! HTTP collaborators (config service, analytics collector, origin) are
//! played by wiremock servers.

mod analytics_tests;
mod origin_tests;
mod pipeline_tests;
mod remote_tests;

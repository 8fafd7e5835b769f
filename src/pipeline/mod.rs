//! Request pipeline
//!
//! [`EdgeMiddleware`] is the entry point: it fetches the origin response and
//! the remote config concurrently, resolves the effective config, builds a
//! [`RequestContext`] and runs the stages in [`run_pipeline`]. Analytics is
//! dispatched in the background once the final response is known.

mod context;
mod middleware;
mod orchestrator;
mod origin;

pub use context::{country_code, ContextBuilder, RequestContext, COUNTRY_HEADERS};
pub use middleware::EdgeMiddleware;
pub use orchestrator::{run_pipeline, PipelineOutcome, Stage, StageError, StageResult};
pub use origin::{bad_gateway, clone_request, HttpOrigin, OriginError, OriginHandler};

//! Pipeline orchestration
//!
//! # Stage Order
//!
//! 1. `robots-txt` - enabled and path is `/robots.txt`
//! 2. `sitemap` - enabled and path is `/sitemap.xml`
//! 3. `well-known` - enabled and path names a configured `.well-known` file
//! 4. `content-optimization` - GEO enabled, the request comes from an AI agent
//!    and the path is not a managed-file path
//!
//! A managed-file stage that produces a response ends the pipeline. A stage
//! that fails is logged and treated as not handled, and the next stage runs.
//! Content optimization only runs when no managed-file stage took effect.

use crate::config::ResolvedConfig;
use crate::geo::optimize_response;
use crate::managed::{
    handle_robots_txt, handle_sitemap, handle_well_known, is_managed_path, well_known_filename,
    ROBOTS_TXT_PATH, SITEMAP_PATH,
};
use crate::pipeline::context::RequestContext;
use crate::EdgeResponse;
use serde::Serialize;
use thiserror::Error;

/// Errors raised inside a stage; never escape the orchestrator
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0}: replace mode requires content")]
    MissingContent(&'static str),

    #[error("Failed to build response: {0}")]
    Http(#[from] http::Error),

    #[error("Response body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of one stage: `Ok(Some(_))` handled, `Ok(None)` not handled
pub type StageResult = Result<Option<EdgeResponse>, StageError>;

/// The pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    RobotsTxt,
    Sitemap,
    WellKnown,
    ContentOptimization,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RobotsTxt => "robots-txt",
            Self::Sitemap => "sitemap",
            Self::WellKnown => "well-known",
            Self::ContentOptimization => "content-optimization",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const MANAGED_STAGES: [Stage; 3] = [Stage::RobotsTxt, Stage::Sitemap, Stage::WellKnown];

/// Final response plus the stages that took effect, in order
#[derive(Debug)]
pub struct PipelineOutcome {
    pub response: EdgeResponse,
    pub stages_applied: Vec<Stage>,
}

/// Runs every stage against the context
///
/// `ctx.response` is replaced by the response of whichever stage takes
/// effect. Returns the applied stages; the list is for auditing only.
pub fn run_pipeline(config: &ResolvedConfig, ctx: &mut RequestContext) -> Vec<Stage> {
    let mut applied = Vec::new();

    for stage in MANAGED_STAGES {
        match run_managed_stage(stage, config, ctx) {
            Ok(Some(response)) => {
                tracing::debug!(stage = stage.as_str(), path = ctx.path(), "Stage handled request");
                ctx.response = response;
                applied.push(stage);
                return applied;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    stage = stage.as_str(),
                    path = ctx.path(),
                    error = %e,
                    "Stage failed, continuing"
                );
            }
        }
    }

    if config.geo.enabled && ctx.agent.is_ai_agent && !is_managed_path(ctx.path()) {
        let stage = Stage::ContentOptimization;
        match optimize_response(&ctx.response, &ctx.url, &config.geo) {
            Ok(outcome) => {
                ctx.classification = outcome.classification;
                if let Some(response) = outcome.response {
                    tracing::debug!(
                        stage = stage.as_str(),
                        path = ctx.path(),
                        page_type = ?ctx.page_type(),
                        "Content optimized"
                    );
                    ctx.response = response;
                    applied.push(stage);
                }
            }
            Err(e) => {
                tracing::warn!(
                    stage = stage.as_str(),
                    path = ctx.path(),
                    error = %e,
                    "Content optimization failed, serving origin response"
                );
            }
        }
    }

    applied
}

/// Runs a managed-file stage if it applies to the request
fn run_managed_stage(stage: Stage, config: &ResolvedConfig, ctx: &RequestContext) -> StageResult {
    let path = ctx.path();

    match stage {
        Stage::RobotsTxt if config.robots_txt.enabled && path == ROBOTS_TXT_PATH => {
            handle_robots_txt(&config.robots_txt, &ctx.response)
        }
        Stage::Sitemap if config.sitemap.enabled && path == SITEMAP_PATH => {
            handle_sitemap(&config.sitemap, &ctx.response)
        }
        Stage::WellKnown if config.well_known.enabled => match well_known_filename(path) {
            Some(filename) => handle_well_known(&config.well_known, filename),
            None => Ok(None),
        },
        _ => Ok(None),
    }
}

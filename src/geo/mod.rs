//! Content optimization (GEO) for AI agents
//!
//! This module classifies pages, synthesizes JSON-LD, extracts summaries and
//! enriches headings. Everything works on raw response text; no DOM is built.

pub mod classify;
pub mod extract;
pub mod headings;
pub mod optimize;
pub mod schema;
pub mod summary;

pub use classify::{classify_page, ClassificationResult, ClassificationSource, Confidence};
pub use extract::PageSignals;
pub use headings::enrich_headings;
pub use optimize::{optimize_response, OptimizeOutcome, GEO_HEADER, PAGE_TYPE_HEADER};
pub use schema::{schema_type_for, synthesize, SchemaInput};
pub use summary::extract_summary;

#![forbid(unsafe_code)]
//! coauthor-core library.
//!
//! Builds a co-authorship graph from per-paper author lists and reduces it
//! to a small, colored subgraph that a force-directed renderer can lay out.
//!
//! ## Pipeline
//!
//! ```text
//! paper records (papers CSV / Scopus JSON)
//!        ↓  aggregate::aggregate_chunked()
//! EdgeSet (canonical unordered pairs → weight)
//!        ↓  degree::DegreeAccumulator / DegreeIndex::from_edges()
//! DegreeIndex (author → distinct co-author count)
//!        ↓  select::top_k()
//! ranked top authors
//!        ↓  subgraph::neighborhood() / subgraph::bounded_fan_out()
//! Subgraph (≤ K nodes, ≤ K·M edges)
//!        ↓  community::Partitioner::partition()
//! communities → view::NetworkView (hand-off to the renderer)
//! ```
//!
//! # Conventions
//!
//! - **Errors**: artifact boundaries return [`error::PipelineError`]; stage
//!   orchestration uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod community;
pub mod config;
pub mod degree;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod records;
pub mod select;
pub mod subgraph;
pub mod table;
pub mod view;

pub use aggregate::{AggregateStats, EdgeAggregator, WeightMode, aggregate_chunked};
pub use community::{GreedyModularity, Partitioner, SingleCommunity, Singletons};
pub use config::{PipelineConfig, load_config};
pub use degree::{DegreeAccumulator, DegreeIndex};
pub use error::{ErrorCode, PipelineError};
pub use model::{Edge, EdgeSet, NameNormalizer, TrimNormalizer};
pub use pipeline::{Artifacts, RecordSource};
pub use select::{RankedAuthor, top_k};
pub use subgraph::{Subgraph, bounded_fan_out, neighborhood};
pub use view::NetworkView;

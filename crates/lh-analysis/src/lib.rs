//! # lh-analysis
//!
//! Cut-and-fill orchestration for lihe. A [`Run`] owns named fills
//! (projection + binning) and an ordered [`CutPipeline`]; each pass over an
//! [`lh_core::EventSource`] produces a [`RunResult`] holding, per fill, the
//! before-cuts and after-cuts histograms and the generated-vs-reconstructed
//! migration matrix.
//!
//! ## Example
//!
//! ```
//! use lh_analysis::Run;
//! use lh_core::{Event, MemorySource};
//! use lh_hist::Axis;
//!
//! let mut run = Run::new();
//! run.register_fill("id", Axis::new(0.0, 10.0, 10).unwrap(), |e: &Event| e.id as f64).unwrap();
//! run.register_cut("odd", true, |e: &Event| e.id % 2 == 1).unwrap();
//!
//! let mut source = MemorySource::single((0..10).map(Event::new).collect());
//! let result = run.execute(&mut source).unwrap();
//! let id = result.get("id").unwrap();
//! assert_eq!(id.before_cuts().total(), 10.0);
//! assert_eq!(id.after_cuts().total(), 5.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod config;
pub mod cut;
pub mod export;
pub mod fill;
pub mod result;
pub mod run;

pub use builtin::{Observable, Selection};
pub use config::{AnalysisConfig, CutConfig, FillConfig, read_config};
pub use cut::{Cut, CutPipeline, TryFn, Verdict};
pub use export::{MigrationArtifact, RunSummary, write_points};
pub use fill::{FillHistograms, FillSpec, Projection};
pub use result::{CutFlowEntry, RunResult};
pub use run::{Pass, PassState, Run};

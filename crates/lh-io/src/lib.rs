//! # lh-io
//!
//! Event sources for lihe.
//!
//! - [`StarlightSource`]: STARlight text output, one view per event.
//! - [`PairSource`]: generated and reconstructed two-track tables, re-synchronised
//!   by their event index columns.
//! - [`TrackTableSource`]: per-event track tables with jagged columns and
//!   optional CASTOR hits.
//!
//! Columnar sources read [`Columns`], which can be built in memory or loaded
//! from Parquet files.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod columns;
pub mod config;
pub mod pair;
pub mod starlight;
pub mod tracks;

pub use columns::{Column, Columns, JaggedColumn};
pub use config::SourceConfig;
pub use pair::PairSource;
pub use starlight::StarlightSource;
pub use tracks::TrackTableSource;

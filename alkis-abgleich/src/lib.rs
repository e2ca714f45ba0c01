//! # alkis-abgleich
//!
//! CLI around the [`abgleich`] reconciliation engine: loads per-state
//! GeoJSON address dumps, runs the correction/expansion/matching pipeline,
//! and writes district exports, coverage summaries and the longitudinal
//! history.
//!
//! ## Usage
//!
//! ```bash
//! alkis-abgleich --date 2026-08-01
//! alkis-abgleich --date 2026-08-01 --states nds,nrw --full-delta
//! ```

pub mod cli;
pub mod export;
pub mod load;
pub mod report;
pub mod reproject;
pub mod state;

pub use report::RunReport;
pub use state::{process_state, StateConfig, StateSummary};

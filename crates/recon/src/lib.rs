//! `runclub-recon`: weekly run-compliance reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded period input and prior state,
//! returns the next state plus a report. Spreadsheet reading lives in
//! `runclub-io`; the only file access here is reading persisted history.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod exemption;
pub mod history;
pub mod model;
pub mod registry;

pub use config::ReconConfig;
pub use engine::{run, PassResult, ReconState};
pub use error::ReconError;
pub use history::HistoryStore;
pub use model::{Member, MemberId, PassReport, PeriodInput, PeriodRange, RunRecord};
pub use registry::Registry;

// File I/O for reconciliation passes: input workbooks and persisted state

pub mod sources;
pub mod state;
pub mod xlsx;

pub use sources::{load_period_input, PeriodSources};
pub use state::{load_state, save_state};
pub use xlsx::SheetGrid;

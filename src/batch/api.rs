//! Public API for the batch scan subsystem

pub use crate::batch::controller::{BatchController, ControlAction};
pub use crate::batch::error::{BatchError, BatchResult};
pub use crate::batch::progress::{BatchProgress, RunStatus};
pub use crate::batch::report::EmailScanResult;
pub use crate::batch::stats::{compute as compute_statistics, BatchStatistics, BreachFrequency};

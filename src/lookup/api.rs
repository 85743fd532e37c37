//! Public API for the exposure lookup subsystem

pub use crate::lookup::client::{BreachClient, DEFAULT_BASE_URL};
pub use crate::lookup::error::{LookupError, LookupResult};
pub use crate::lookup::severity::{classify, Severity};
pub use crate::lookup::traits::ExposureLookup;
pub use crate::lookup::types::{Breach, Paste, PasteOutcome, ScanOutcome, ScanStatus};

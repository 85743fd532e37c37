// Internal modules - all access should go through api module
pub(crate) mod controller;
pub(crate) mod error;
pub(crate) mod progress;
pub(crate) mod report;
pub(crate) mod stats;

// Public API module - the only public interface for the batch subsystem
pub mod api;

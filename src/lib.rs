pub mod app;
pub mod batch;
pub mod core;
pub mod export;
pub mod lookup;
pub mod notifications;

include!(concat!(env!("OUT_DIR"), "/version.rs"));

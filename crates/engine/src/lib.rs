// In crates/engine/src/lib.rs

pub mod scheduler;
pub mod shutdown;
pub mod status;
pub mod store;
pub mod trend;

pub use scheduler::{CycleOutcome, CycleStats, Tracker, unix_now};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use store::SampleStore;
pub use trend::{Trend, resolve};

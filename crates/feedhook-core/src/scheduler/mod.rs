mod service;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

pub use service::{next_delay, WatchService};
pub use tasks::{check_once, run_cycle, CycleOutcome};

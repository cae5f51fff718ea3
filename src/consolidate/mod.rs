pub mod candidate;
pub mod errors;
pub mod executor;
pub mod operation;
pub mod planner;
pub mod retry;
pub mod run;
pub mod tracker;

pub use errors::*;

#[cfg(test)]
mod tracker_test;

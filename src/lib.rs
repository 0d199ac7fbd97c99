pub mod cmd;
pub mod error;
pub mod fabric;
pub mod report;
pub mod router;
pub mod snapshot;
pub mod solver;
pub mod telemetry;
pub mod topo;

pub use error::{Result, RouterError};

#[cfg(test)]
mod test;

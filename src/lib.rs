//! actkit - local CI cache and artifact services
//!
//! Emulates a build cache service and a workflow artifact store on the local
//! filesystem, so workflow-style programs can run on a developer machine.

pub mod archive;
pub mod artifact;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod session;

pub use error::{ActkitError, ActkitResult};

//! Service layer: synchronization glue and the typed client facade.
//!
//! [`KumaClient`] coordinates the connection and the push caches;
//! [`convergence`] turns push delivery into bounded reads.

pub mod client;
pub mod convergence;

pub use client::{KumaClient, Session};

//! `sentinel-recon`: source/target table reconciliation engine.
//!
//! Pure engine crate: receives two materialized row sets, returns one
//! [`ComparisonResult`]. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod keys;
pub mod mismatch;
pub mod model;
pub mod observer;
pub mod value;

pub use config::JobConfig;
pub use engine::{reconcile, reconcile_with_observer, ReconOptions};
pub use error::ReconError;
pub use keys::DuplicatePolicy;
pub use model::{ComparisonResult, Row, Side, Strategy};
pub use observer::{ReconEvent, ReconObserver};
pub use value::Value;

//! `routerecon-recon`: reconciliation of extracted entities against
//! reference records.
//!
//! Pure engine crate: receives extracted records and already-fetched
//! reference data, returns classified comparison rows.
//! No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod model;

pub use config::{EntityConfig, ReconConfig, ReferenceLayout};
pub use engine::{reconcile, reconcile_with, run};
pub use error::ReconError;
pub use key::{KeySource, MatchKey};
pub use model::{
    ClassResult, ComparisonRow, KeyCollision, ReconMeta, ReconResult, ReconSummary, Reconciliation, ReferenceRecord,
    ReferenceRecords, Side, Status,
};

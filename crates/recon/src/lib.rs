//! `pobtrack-recon`: POB delta inference and manifest reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded ledger and manifest snapshots,
//! returns inferred movements and per-day classifications.
//! No CLI or filesystem dependencies.

pub mod aggregate;
pub mod capacity;
pub mod cargo_filter;
pub mod classify;
pub mod config;
pub mod differ;
pub mod direction;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;

pub use cargo_filter::CargoFilter;
pub use config::ReconConfig;
pub use differ::diff_ledger;
pub use direction::{resolve, Direction, DirectionMap, DirectionMode};
pub use engine::run;
pub use error::ReconError;
pub use model::{DateKey, Ledger, LedgerRow, MovementToken, ReconClass, ReconInput, ReconResult};

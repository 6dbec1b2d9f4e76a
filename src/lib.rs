//! Pharmarep
//!
//! Pharmarep keeps the records of pharmaceutical field representatives: cash
//! collections and orders taken on pharmacy visits, their approval status, and
//! order lines that arrived short. Records are stored as JSON arrays and
//! grouped into per-visit batches for review.

pub mod config;
pub mod export;
pub mod fixtures;
pub mod groups;
pub mod ledger;
pub mod lifecycle;
pub mod logging;
pub mod missing;
pub mod prelude;
pub mod products;
pub mod receipt;
pub mod records;
pub mod repository;
pub mod status;
pub mod store;

mod lenient;

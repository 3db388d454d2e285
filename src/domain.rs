//! Domain models for the reliability analysis.
//!
//! This module contains the fault tree, the FMEA worksheet, the reference
//! data for the cooling system, and configuration.

/// Fault tree structure and traversal.
pub mod fault_tree;
pub use fault_tree::{Edge, FaultTree, FaultTreeNode, TopologyError};

/// FMEA ratings, records and ranking.
pub mod fmea;
pub use fmea::{FmeaRecord, FmeaTable, Rating, RatingError};

mod config;
pub use config::{Config, OutlineStyle};

/// Reference data and dataset files.
pub mod dataset;
pub use dataset::{Dataset, DatasetError};

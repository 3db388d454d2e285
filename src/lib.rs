//! Cooling System Reliability Analysis
//!
//! Builds the fault tree and FMEA worksheet for the electric cooling system of
//! a hybrid vehicle, and writes a text outline, a ranked FMEA export, a
//! diagram, and a combined report.

pub mod domain;
pub use domain::{
    Config, Dataset, DatasetError, Edge, FaultTree, FaultTreeNode, FmeaRecord, FmeaTable,
    OutlineStyle, Rating, TopologyError,
};

/// Text renderings: outline, FMEA tables, DOT.
pub mod render;

/// Diagram rendering through an external layout tool.
pub mod diagram;
pub use diagram::{DiagramError, DiagramRenderer};

/// The combined report.
pub mod report;
pub use report::{Report, ReportOptions};

/// End-to-end analysis run.
pub mod analysis;
pub use analysis::{Analysis, AnalysisError, Artifact, Artifacts, DiagramOutcome};

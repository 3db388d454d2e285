//! Analysis input data
//!
//! A [`Dataset`] bundles the fault tree topology with the FMEA worksheet. The
//! compiled-in reference data describes the electric cooling system of a
//! hybrid vehicle; a TOML file with the same shape can replace it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::{
    fault_tree::{Edge, FaultTree, TopologyError},
    fmea::{FmeaRecord, FmeaTable, Rating},
};

/// Top event of the reference fault tree.
pub const REFERENCE_ROOT: &str = "Cooling system failure";

/// Reference fault tree topology, as `(parent, child)` pairs in authoring
/// order.
pub const REFERENCE_EDGES: &[(&str, &str)] = &[
    (REFERENCE_ROOT, "Water pump failure"),
    (REFERENCE_ROOT, "Radiator fan failure"),
    (REFERENCE_ROOT, "Temperature sensor failure"),
    (REFERENCE_ROOT, "Coolant leak"),
    ("Water pump failure", "Motor burnout"),
    ("Water pump failure", "Impeller damage"),
    ("Water pump failure", "Circuit short"),
    ("Water pump failure", "Bearing wear"),
    ("Radiator fan failure", "Motor fault"),
    ("Radiator fan failure", "Bearing wear"),
    ("Radiator fan failure", "Control module failure"),
    ("Temperature sensor failure", "Signal drift"),
    ("Temperature sensor failure", "Loose connector"),
    ("Coolant leak", "Pipe rupture"),
    ("Coolant leak", "Seal ageing"),
];

/// Fault tree topology as stored in a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeSpec {
    /// Label of the top event.
    pub root: String,
    /// Parent→child edges, parents before children.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl TreeSpec {
    /// The reference cooling system topology.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            root: REFERENCE_ROOT.to_string(),
            edges: REFERENCE_EDGES
                .iter()
                .map(|(parent, child)| Edge::new(*parent, *child))
                .collect(),
        }
    }

    /// Builds the fault tree.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if an edge refers to a missing or ambiguous
    /// parent.
    pub fn build(&self) -> Result<FaultTree, TopologyError> {
        FaultTree::from_edges(&self.root, &self.edges)
    }
}

impl FaultTree {
    /// The reference cooling system fault tree.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in topology is malformed.
    #[must_use]
    pub fn reference() -> Self {
        TreeSpec::reference()
            .build()
            .expect("reference fault tree topology is well-formed")
    }
}

/// The reference FMEA worksheet for the cooling system.
#[must_use]
pub fn reference_fmea() -> FmeaTable {
    FmeaTable::new(vec![
        FmeaRecord::builder("Electric water pump")
            .function("Coolant circulation")
            .failure_mode("Insufficient flow")
            .effect("System overheating")
            .recommended_action("Add a flow sensor")
            .rated(Rating::literal(8), Rating::literal(3), Rating::literal(4)),
        FmeaRecord::builder("Radiator fan")
            .function("Radiator cooling")
            .failure_mode("Abnormal speed")
            .effect("Insufficient heat dissipation")
            .recommended_action("Improve the control algorithm")
            .rated(Rating::literal(7), Rating::literal(4), Rating::literal(5)),
        FmeaRecord::builder("Temperature sensor")
            .function("Temperature monitoring")
            .failure_mode("Reading deviation")
            .effect("False alarm")
            .recommended_action("Redundant dual-sensor design")
            .rated(Rating::literal(5), Rating::literal(6), Rating::literal(7)),
        FmeaRecord::builder("Coolant pipe")
            .function("Coolant delivery")
            .failure_mode("Leakage")
            .effect("Insufficient cooling")
            .recommended_action("Periodic inspection and replacement")
            .rated(Rating::literal(9), Rating::literal(2), Rating::literal(3)),
    ])
}

/// Everything the analysis needs as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    tree: FaultTree,
    fmea: FmeaTable,
}

/// Errors that can occur when loading a dataset file.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Read {
        /// Path of the dataset file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a valid dataset document.
    #[error("failed to parse dataset {path}: {source}")]
    Parse {
        /// Path of the dataset file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// The tree topology is inconsistent.
    #[error("invalid fault tree in {path}: {source}")]
    Topology {
        /// Path of the dataset file.
        path: PathBuf,
        /// The topology problem.
        source: TopologyError,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetFile {
    tree: TreeSpec,
    #[serde(default)]
    fmea: Vec<FmeaRecord>,
}

impl Dataset {
    /// Creates a dataset from an already-built tree and worksheet.
    #[must_use]
    pub const fn new(tree: FaultTree, fmea: FmeaTable) -> Self {
        Self { tree, fmea }
    }

    /// The compiled-in cooling system data.
    #[must_use]
    pub fn reference() -> Self {
        Self::new(FaultTree::reference(), reference_fmea())
    }

    /// Loads a dataset from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read or parsed, or if its
    /// tree topology is inconsistent.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: DatasetFile = toml::from_str(&content).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let tree = file.tree.build().map_err(|source| DatasetError::Topology {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            nodes = tree.len(),
            records = file.fmea.len(),
            "loaded dataset from {}",
            path.display()
        );
        Ok(Self::new(tree, FmeaTable::new(file.fmea)))
    }

    /// Serialises the dataset to the TOML file format read by
    /// [`Dataset::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let file = DatasetFile {
            tree: TreeSpec {
                root: self.tree.root().label().to_string(),
                edges: self.tree.edges(),
            },
            fmea: self.fmea.records().to_vec(),
        };
        toml::to_string_pretty(&file)
    }

    /// The fault tree.
    #[must_use]
    pub const fn tree(&self) -> &FaultTree {
        &self.tree
    }

    /// The FMEA worksheet.
    #[must_use]
    pub const fn fmea(&self) -> &FmeaTable {
        &self.fmea
    }
}

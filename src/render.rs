//! Text renderings of the analysis data.

/// Graphviz DOT description of the fault tree.
pub mod dot;
pub use dot::{DotOptions, looks_like_digraph, to_dot};

/// Indented outline of the fault tree.
pub mod outline;
pub use outline::{outline, outline_text};

/// FMEA worksheet as a text table, CSV, or serialisable rows.
pub mod table;
pub use table::{RankedRow, csv, ranked_rows, text_table};

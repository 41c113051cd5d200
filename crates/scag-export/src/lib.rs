//! scag-export: Pure format serializers (sans-IO)
//!
//! Converts scagnostics results into output formats: a delimited
//! measure table, a JSON report, and a diagnostic SVG of one pair's
//! structures.

pub mod json;
pub mod svg;
pub mod table;

pub use json::{PairRecord, Report, to_json};
pub use svg::{SvgMetadata, to_pair_svg};
pub use table::{TableMetadata, to_table};

//! Bill-of-materials comparison engine.
//!
//! Rows from heterogeneous exports are mapped onto canonical attributes by
//! [`header`] filters, turned into [`item::Item`]s and collected into flat
//! [`collection::Bom`]s or tree-shaped [`structured::StructuredBom`]s.
//! Two collections are compared by item identity ([`diff::flat`]); two
//! assembly trees are walked together, comparing the children of every
//! matched assembly ([`diff::hierarchy`]). [`format`] renders the results.
//!
//! Module map:
//! - [`value`]: parsed cell values.
//! - [`category`]: category code and name table.
//! - [`header`]: header filters, matchers and value parsers.
//! - [`equivalence`]: groups of interchangeable identity values.
//! - [`item`]: the line model, identity and attribute diff.
//! - [`dialect`]: per-export schema and item construction strategies.
//! - [`collection`]: flat collections and their diff.
//! - [`tree`]: positions, level counter and the arena-backed tree.
//! - [`structured`]: tree building, flattening, rebuilding and export.
//! - [`diff`]: flat and hierarchical comparison results.
//! - [`format`]: text, table, nested and JSON renderers.
//! - [`error`]: error types.

pub mod category;
pub mod collection;
pub mod dialect;
pub mod diff;
pub mod equivalence;
pub mod error;
pub mod format;
pub mod header;
pub mod item;
pub mod structured;
pub mod tree;
pub mod value;

pub use category::Categories;
pub use collection::Bom;
pub use dialect::{Dialect, PositionSource};
pub use diff::{AssemblyDiff, BomDiff, DiffCounts, FlatReport, StructuredReport};
pub use equivalence::EquivalenceGroups;
pub use error::{BuildError, DiffError, SchemaError, TreeError};
pub use header::{FilterSet, FilterSpec, HeaderFilter, Matcher, ValueParser};
pub use item::{HeaderIndex, Item, ItemSchema};
pub use structured::StructuredBom;
pub use tree::AssemblyTree;
pub use value::Value;

//! Error types raised by the comparison engine.
//!
//! Schema errors come from turning a row into an [`Item`](crate::Item);
//! tree errors come from building or walking an assembly tree. Neither is
//! recovered inside the engine.

use thiserror::Error;

/// Failures while constructing an item from a source row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// One or more critical attributes had no matching column.
    #[error("critical attributes not found in header {header:?}: {}", .missing.join(", "))]
    MissingCritical {
        missing: Vec<String>,
        header: Vec<String>,
    },
    /// No column matched the primary comparison attribute.
    #[error("primary comparison attribute '{attribute}' not found in header {header:?}")]
    MissingPrimary {
        attribute: String,
        header: Vec<String>,
    },
    /// A cell could not be parsed by its attribute's value parser.
    #[error("failed to parse attribute '{attribute}' with matched header name '{header}': {message}")]
    Parse {
        attribute: String,
        header: String,
        message: String,
    },
    /// A filter declared an alias that is not a registered filter.
    #[error("filter '{filter}' declares unknown equivalent filter '{alias}'")]
    UnknownAlias { filter: String, alias: String },
}

/// Failures while building or addressing an assembly tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A branch already holds a value at this position.
    #[error("duplicate tree position {position}")]
    DuplicatePosition { position: String },
    /// `build_tree` was called on a collection whose tree is populated.
    #[error("{name} tree is not empty; clear it before rebuilding")]
    NotCleared { name: String },
    /// A segment along the requested path does not exist.
    #[error("tree position {missing} not found while resolving {requested}")]
    PositionNotFound { requested: String, missing: String },
    /// A position string is not a dotted list of integers.
    #[error("invalid tree position '{0}'")]
    InvalidPosition(String),
    /// A level number is below the counter's base level.
    #[error("level {level} is below the minimum level {min_level}")]
    LevelBelowMinimum { level: i64, min_level: i64 },
    /// A level number nests deeper than the counter numbers.
    #[error("level {level} is more than {max_depth} levels below the minimum level {min_level}")]
    LevelTooDeep {
        level: i64,
        min_level: i64,
        max_depth: usize,
    },
}

/// Failures while loading a collection from rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: SchemaError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(
        "duplicate tree numbers in {collection} detected: {incoming} tried to override {existing} with num {position}"
    )]
    DuplicateItem {
        collection: String,
        position: String,
        existing: String,
        incoming: String,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Failures while comparing two collections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    /// Both sides resolved a diff name to different, unrelated attributes.
    #[error("diff name '{name}' resolves to '{left}' on the left and '{right}' on the right")]
    AttributeConflict {
        name: String,
        left: String,
        right: String,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

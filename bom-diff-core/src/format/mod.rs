//! Report renderers.
//!
//! All renderers are pure functions of a diff report. Each one shows a
//! report without differences as "BOMs match".

pub mod json;
pub mod nested;
pub mod table;
pub mod text;

pub use json::{format_json, JsonReport};
pub use nested::{
    nested_flat, nested_tree, AttributeChange, NestedChange, NestedEntry, NestedReport,
};
pub use table::{table_flat, table_tree, CellStyle, Table};
pub use text::{format_summary, format_text, format_tree_text, TextOptions};

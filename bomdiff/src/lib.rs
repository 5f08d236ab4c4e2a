//! bomdiff: settings, dialect presets, CSV sources and terminal rendering
//! around the `bom-diff-core` engine.
//!
//! Module map:
//! - [`settings`]: TOML settings with embedded defaults.
//! - [`dialects`]: flat and structured dialects built from settings.
//! - [`source`]: CSV exports and equivalence tables.
//! - [`report`]: colored terminal rendering of diff reports.
//! - [`inspect`]: item list and assembly tree views of one export.

pub mod dialects;
pub mod inspect;
pub mod report;
pub mod settings;
pub mod source;

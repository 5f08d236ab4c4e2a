//! Delimited-text BOM sources.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bom_diff_core::{Bom, BuildError, Dialect, EquivalenceGroups, StructuredBom};
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned when reading BOM exports and equivalence tables.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported file {path}: expected a .csv export")]
    Unsupported { path: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Csv { path: String, source: csv::Error },
    #[error("failed to load {path}: {source}")]
    Build { path: String, source: BuildError },
}

/// Parse CSV text into rows. A leading byte-order mark is dropped, rows may
/// have different lengths and rows with only blank cells are skipped.
pub fn parse_rows(raw: &str) -> Result<Vec<Vec<String>>, csv::Error> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read every row of a `.csv` file.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, SourceError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(SourceError::Unsupported {
            path: path.display().to_string(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = parse_rows(&raw).map_err(|source| SourceError::Csv {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), "read rows");
    Ok(rows)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_error(path: &Path) -> impl FnOnce(BuildError) -> SourceError + '_ {
    move |source| SourceError::Build {
        path: path.display().to_string(),
        source,
    }
}

/// Load a flat collection named after the file.
pub fn load_flat(path: &Path, dialect: Arc<Dialect>) -> Result<Bom, SourceError> {
    let rows = read_rows(path)?;
    let bom = Bom::from_rows(display_name(path), dialect, rows).map_err(build_error(path))?;
    info!(path = %path.display(), items = bom.len(), "loaded flat BOM");
    Ok(bom)
}

/// Load a structured collection named after the file and build its tree.
pub fn load_structured(path: &Path, dialect: Arc<Dialect>) -> Result<StructuredBom, SourceError> {
    let rows = read_rows(path)?;
    let bom =
        StructuredBom::from_rows(display_name(path), dialect, rows).map_err(build_error(path))?;
    info!(path = %path.display(), items = bom.len(), "loaded structured BOM");
    Ok(bom)
}

/// Read an equivalence table: one group per row, the first value canonical.
pub fn read_equivalents(path: &Path) -> Result<EquivalenceGroups, SourceError> {
    let groups = read_rows(path)?
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.trim().to_string())
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect();
    Ok(EquivalenceGroups::new(groups))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::{parse_rows, read_equivalents, read_rows, SourceError};

    #[test]
    fn rows_keep_quoted_cells_and_ragged_lengths() {
        let rows = parse_rows("\u{feff}Item ID,Description\n\"ASM-000100-01\",\"Frame, welded\"\nPRT-000110-01\n")
            .expect("valid csv");
        assert_eq!(rows[0], ["Item ID", "Description"]);
        assert_eq!(rows[1], ["ASM-000100-01", "Frame, welded"]);
        assert_eq!(rows[2], ["PRT-000110-01"]);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let rows = parse_rows("Item ID\n,\nPRT-000110-01\n , \n").expect("valid csv");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn only_csv_files_are_read() {
        let err = read_rows(Path::new("bom.xlsx")).expect_err("not csv");
        assert!(matches!(err, SourceError::Unsupported { .. }));
    }

    #[test]
    fn equivalents_drop_empty_cells_and_rows() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("equivalent_items.csv");
        fs::write(&path, "000100,000900,\n,\n000200, 000201\n").expect("write table");

        let groups = read_equivalents(&path).expect("valid table");
        let groups: Vec<Vec<String>> = groups.iter().map(<[String]>::to_vec).collect();
        assert_eq!(
            groups,
            vec![
                vec!["000100".to_string(), "000900".to_string()],
                vec!["000200".to_string(), "000201".to_string()],
            ]
        );
    }
}

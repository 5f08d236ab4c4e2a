use tracing::warn;

use crate::header::{clean_cell, ValueParser};
use crate::value::Value;

/// Groups of interchangeable identity values, as supplied by the user.
///
/// Each group is one row; its first entry is the canonical value the others
/// resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceGroups {
    groups: Vec<Vec<String>>,
}

impl EquivalenceGroups {
    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.groups.iter().map(Vec::as_slice)
    }
}

/// Equivalence groups parsed with the primary attribute's value parser.
///
/// Each group also answers to the cleaned source text of its entries, so
/// values that never went through the parser (numbers split out of a
/// composite item id) still find their group.
#[derive(Debug, Clone, Default)]
pub struct EquivalenceTable {
    groups: Vec<Group>,
}

#[derive(Debug, Clone)]
struct Group {
    canonical: Value,
    members: Vec<Value>,
}

impl EquivalenceTable {
    /// Parse every group. Empty groups and unparsable entries are skipped.
    pub fn parse(raw: &EquivalenceGroups, parser: &ValueParser) -> Self {
        let mut groups = Vec::with_capacity(raw.len());
        for (row, group) in raw.iter().enumerate() {
            let mut canonical = None;
            let mut members = Vec::new();
            for cell in group.iter().map(String::as_str).map(clean_cell) {
                if cell.is_empty() {
                    continue;
                }
                match parser.parse(&cell) {
                    Ok(value) => {
                        canonical.get_or_insert_with(|| value.clone());
                        let text = Value::text(cell.as_str());
                        if text != value {
                            members.push(text);
                        }
                        members.push(value);
                    }
                    Err(message) => {
                        warn!(row = row + 1, %cell, %message, "ignoring equivalent item value");
                    }
                }
            }
            match canonical {
                Some(canonical) => groups.push(Group { canonical, members }),
                None => warn!(row = row + 1, "ignoring empty equivalence group"),
            }
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Canonical value of the first group containing `value`.
    pub fn canonical(&self, value: &Value) -> Option<&Value> {
        self.groups
            .iter()
            .find(|group| group.members.contains(value))
            .map(|group| &group.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::{EquivalenceGroups, EquivalenceTable};
    use crate::header::ValueParser;
    use crate::value::Value;

    fn groups(rows: &[&[&str]]) -> EquivalenceGroups {
        EquivalenceGroups::new(
            rows.iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn first_matching_group_wins() {
        let raw = groups(&[&["100", "200"], &["300", "200"]]);
        let table = EquivalenceTable::parse(&raw, &ValueParser::CodeOrNumber);
        assert_eq!(table.canonical(&Value::text("200")), Some(&Value::text("100")));
        assert_eq!(table.canonical(&Value::text("300")), Some(&Value::text("300")));
        assert_eq!(table.canonical(&Value::text("400")), None);
    }

    #[test]
    fn values_use_the_primary_parser() {
        let raw = groups(&[&["000100", "0200"], &[""]]);
        let table = EquivalenceTable::parse(&raw, &ValueParser::CodeOrNumber);
        assert_eq!(table.canonical(&Value::text("200")), Some(&Value::text("100")));
        assert!(!table.is_empty());
    }

    #[test]
    fn unparsed_spellings_find_their_group() {
        let raw = groups(&[&["000110", "000111"]]);
        let table = EquivalenceTable::parse(&raw, &ValueParser::CodeOrNumber);
        assert_eq!(table.canonical(&Value::text("000111")), Some(&Value::text("110")));
        assert_eq!(table.canonical(&Value::text("111")), Some(&Value::text("110")));
    }
}

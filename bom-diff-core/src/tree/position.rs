use crate::error::TreeError;

/// A parsed dotted tree position such as `"2.1.3"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePosition {
    segments: Vec<u64>,
}

impl TreePosition {
    /// Parse a dotted position. Every segment must be a non-negative integer.
    pub fn parse(raw: &str) -> Result<Self, TreeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TreeError::InvalidPosition(raw.to_string()));
        }
        let segments = trimmed
            .split('.')
            .map(|segment| segment.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| TreeError::InvalidPosition(raw.to_string()))?;
        Ok(Self { segments })
    }

    /// Nesting level: `"1"` is level 1, `"1.2"` is level 2.
    pub fn level(&self) -> usize {
        self.segments.len()
    }

    /// Index of the top-level ancestor.
    pub fn top(&self) -> u64 {
        self.segments[0]
    }

    /// Position of the parent, or an empty string at the top level.
    pub fn parent(&self) -> String {
        join(&self.segments[..self.segments.len() - 1])
    }

    pub fn as_string(&self) -> String {
        join(&self.segments)
    }
}

fn join(segments: &[u64]) -> String {
    segments
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Every prefix of a dotted position, shortest first.
///
/// `"1.2.3"` yields `"1"`, `"1.2"`, `"1.2.3"`. The segments are not validated,
/// so this also works for report positions.
pub fn prefixes(position: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for (i, segment) in position.split('.').enumerate() {
        if i > 0 {
            current.push('.');
        }
        current.push_str(segment);
        out.push(current.clone());
    }
    out
}

use std::collections::HashMap;

use crate::error::TreeError;

/// Deepest nesting a counter will number, relative to its base level.
pub const MAX_DEPTH: usize = 64;

/// Generates sequential dotted positions from a stream of nesting levels.
///
/// Scoped to a single build: create one per tree construction.
#[derive(Debug, Clone, Default)]
pub struct TreeCounter {
    counts: HashMap<usize, u64>,
    prev_level: usize,
    min_level: i64,
}

impl TreeCounter {
    /// Counter whose shallowest level is `min_level`.
    pub fn new(min_level: i64) -> Self {
        Self {
            counts: HashMap::new(),
            prev_level: 0,
            min_level,
        }
    }

    /// Next `(position, parent_position)` for an item at `level`.
    ///
    /// Going deeper restarts numbering at 1; staying level or rising keeps
    /// counting where that level left off.
    pub fn next(&mut self, level: i64) -> Result<(String, String), TreeError> {
        if level < self.min_level {
            return Err(TreeError::LevelBelowMinimum {
                level,
                min_level: self.min_level,
            });
        }
        let too_deep = || TreeError::LevelTooDeep {
            level,
            min_level: self.min_level,
            max_depth: MAX_DEPTH,
        };
        let shifted = level.checked_sub(self.min_level).ok_or_else(too_deep)?;
        let level = usize::try_from(shifted)
            .ok()
            .filter(|depth| *depth <= MAX_DEPTH)
            .ok_or_else(too_deep)?;

        for depth in 0..=level {
            self.counts
                .entry(depth)
                .or_insert(if depth == level { 0 } else { 1 });
        }
        if self.prev_level < level {
            self.counts.insert(level, 0);
        }
        self.prev_level = level;
        *self.counts.entry(level).or_insert(0) += 1;

        let segments: Vec<String> = (0..=level)
            .map(|depth| self.counts.get(&depth).copied().unwrap_or(1).to_string())
            .collect();
        let parent = segments[..level].join(".");
        Ok((segments.join("."), parent))
    }
}

#[cfg(test)]
mod tests {
    use super::TreeCounter;
    use crate::error::TreeError;

/// Deepest nesting a counter will number, relative to its base level.
pub const MAX_DEPTH: usize = 64;

    fn positions(counter: &mut TreeCounter, levels: &[i64]) -> Vec<String> {
        levels
            .iter()
            .map(|level| counter.next(*level).expect("level in range").0)
            .collect()
    }

    #[test]
    fn numbers_follow_level_changes() {
        let mut counter = TreeCounter::new(0);
        assert_eq!(
            positions(&mut counter, &[0, 1, 1, 2, 1, 0, 1]),
            vec!["1", "1.1", "1.2", "1.2.1", "1.3", "2", "2.1"]
        );
    }

    #[test]
    fn min_level_shifts_the_base() {
        let mut counter = TreeCounter::new(1);
        assert_eq!(
            counter.next(2).expect("level in range"),
            ("1.1".to_string(), "1".to_string())
        );
        assert_eq!(
            counter.next(0),
            Err(TreeError::LevelBelowMinimum {
                level: 0,
                min_level: 1
            })
        );
    }

    #[test]
    fn extreme_levels_are_rejected() {
        let mut counter = TreeCounter::new(i64::MIN);
        assert_eq!(
            counter.next(i64::MAX),
            Err(TreeError::LevelTooDeep {
                level: i64::MAX,
                min_level: i64::MIN,
                max_depth: MAX_DEPTH,
            })
        );

        let mut counter = TreeCounter::new(0);
        assert!(matches!(
            counter.next(MAX_DEPTH as i64 + 1),
            Err(TreeError::LevelTooDeep { .. })
        ));
        assert!(counter.next(MAX_DEPTH as i64).is_ok());
    }
}

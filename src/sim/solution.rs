//! Required masks per cell, with an optional ordered path

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::grid::Cell;
use super::mask::Mask;
use crate::error::ConfigError;

/// One authored requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub cell: Cell,
    pub mask: Mask,
}

/// Serialized form of a solution table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SolutionRepr {
    masks: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<Vec<Cell>>,
}

/// Win condition of a puzzle: which cells are on the path and the mask
/// each must show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SolutionRepr", into = "SolutionRepr")]
pub struct SolutionTable {
    required: BTreeMap<Cell, Mask>,
    path: Option<Vec<Cell>>,
}

impl SolutionTable {
    /// Table without a traversal order (global matching only)
    pub fn from_masks(masks: impl IntoIterator<Item = (Cell, Mask)>) -> Self {
        Self {
            required: masks.into_iter().collect(),
            path: None,
        }
    }

    /// Table with a traversal order from source to target
    pub fn with_path(masks: impl IntoIterator<Item = (Cell, Mask)>, path: Vec<Cell>) -> Self {
        Self {
            required: masks.into_iter().collect(),
            path: Some(path),
        }
    }

    #[inline]
    pub fn required(&self, cell: Cell) -> Option<Mask> {
        self.required.get(&cell).copied()
    }

    #[inline]
    pub fn is_on_path(&self, cell: Cell) -> bool {
        self.required.contains_key(&cell)
    }

    /// Required masks in cell order
    pub fn iter(&self) -> impl Iterator<Item = (Cell, Mask)> + '_ {
        self.required.iter().map(|(c, m)| (*c, *m))
    }

    pub fn len(&self) -> usize {
        self.required.len()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    pub fn path(&self) -> Option<&[Cell]> {
        self.path.as_deref()
    }

    /// Position of `cell` along the ordered path
    pub fn path_index(&self, cell: Cell) -> Option<usize> {
        self.path.as_ref()?.iter().position(|c| *c == cell)
    }

    /// Check the table is usable for path stepping: a path of at least two
    /// distinct cells, and the path and mask table cover the same cells.
    pub fn validate_for_path(&self) -> Vec<ConfigError> {
        let Some(path) = &self.path else {
            return vec![ConfigError::MissingPath];
        };
        let mut issues = Vec::new();
        if path.len() < 2 {
            issues.push(ConfigError::PathTooShort(path.len()));
        }
        let mut seen = BTreeSet::new();
        for cell in path {
            if !seen.insert(*cell) {
                issues.push(ConfigError::PathRevisits(*cell));
            }
            if !self.required.contains_key(cell) {
                issues.push(ConfigError::PathCellWithoutMask(*cell));
            }
        }
        for cell in self.required.keys() {
            if !seen.contains(cell) {
                issues.push(ConfigError::MaskCellOffPath(*cell));
            }
        }
        issues
    }
}

impl From<SolutionRepr> for SolutionTable {
    fn from(repr: SolutionRepr) -> Self {
        Self {
            required: repr.masks.into_iter().map(|r| (r.cell, r.mask)).collect(),
            path: repr.path,
        }
    }
}

impl From<SolutionTable> for SolutionRepr {
    fn from(table: SolutionTable) -> Self {
        Self {
            masks: table
                .required
                .into_iter()
                .map(|(cell, mask)| Requirement { cell, mask })
                .collect(),
            path: table.path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Cell {
        Cell::new(x, y)
    }

    fn m(bits: u8) -> Mask {
        Mask::truncate(bits)
    }

    #[test]
    fn test_valid_path_table() {
        let table = SolutionTable::with_path(
            [(c(0, 0), m(2)), (c(1, 0), m(10)), (c(2, 0), m(8))],
            vec![c(0, 0), c(1, 0), c(2, 0)],
        );
        assert!(table.validate_for_path().is_empty());
        assert_eq!(table.path_index(c(2, 0)), Some(2));
        assert_eq!(table.required(c(1, 0)), Some(m(10)));
        assert!(!table.is_on_path(c(0, 1)));
    }

    #[test]
    fn test_path_and_table_must_agree() {
        let table = SolutionTable::with_path(
            [(c(0, 0), m(2)), (c(3, 3), m(8))],
            vec![c(0, 0), c(1, 0)],
        );
        let issues = table.validate_for_path();
        assert!(issues.contains(&ConfigError::PathCellWithoutMask(c(1, 0))));
        assert!(issues.contains(&ConfigError::MaskCellOffPath(c(3, 3))));
    }

    #[test]
    fn test_missing_or_short_path() {
        let table = SolutionTable::from_masks([(c(0, 0), m(2))]);
        assert_eq!(table.validate_for_path(), vec![ConfigError::MissingPath]);

        let table = SolutionTable::with_path([(c(0, 0), m(2))], vec![c(0, 0)]);
        assert_eq!(table.validate_for_path(), vec![ConfigError::PathTooShort(1)]);
    }

    #[test]
    fn test_revisit_reported() {
        let table = SolutionTable::with_path(
            [(c(0, 0), m(2)), (c(1, 0), m(10))],
            vec![c(0, 0), c(1, 0), c(0, 0)],
        );
        assert_eq!(table.validate_for_path(), vec![ConfigError::PathRevisits(c(0, 0))]);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{ "masks": [ { "cell": [1, 0], "mask": 10 }, { "cell": [0, 0], "mask": 2 } ] }"#;
        let table: SolutionTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.path(), None);
        assert_eq!(table.iter().next(), Some((c(0, 0), m(2))));
    }
}

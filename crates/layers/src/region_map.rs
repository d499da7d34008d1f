use std::collections::HashMap;
use std::fmt;

use foundation::ids::{PointId, RegionId};

use crate::boundaries::BoundaryDataset;

/// Sorted, de-duplicated set of region ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RegionSet(Vec<RegionId>);

impl RegionSet {
    pub fn new(ids: impl IntoIterator<Item = RegionId>) -> Self {
        let mut v: Vec<RegionId> = ids.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.0.iter().copied()
    }

    /// Splits into ids present in `dataset` and ids it does not know.
    pub fn partition_known(&self, dataset: &BoundaryDataset) -> (RegionSet, Vec<RegionId>) {
        let (known, unknown): (Vec<RegionId>, Vec<RegionId>) =
            self.0.iter().partition(|id| dataset.contains(**id));
        (RegionSet(known), unknown)
    }
}

impl fmt::Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}

/// Point id to highlightable regions. A point without an entry (or with an
/// empty set) has nothing to highlight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionMap {
    entries: HashMap<PointId, RegionSet>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, point: impl Into<PointId>, regions: RegionSet) {
        self.entries.insert(point.into(), regions);
    }

    pub fn regions_for(&self, point: &str) -> Option<&RegionSet> {
        self.entries.get(point).filter(|set| !set.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PointId, RegionSet)> for RegionMap {
    fn from_iter<I: IntoIterator<Item = (PointId, RegionSet)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

use std::collections::HashMap;

use foundation::ids::RegionId;

/// Closed ring of `[lon, lat]` vertices in degrees. The closing vertex may or
/// may not repeat the first one.
pub type Ring = Vec<[f64; 2]>;

/// Outer ring first, holes after.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// `None` for features without a usable id; they still paint as land.
    pub id: Option<RegionId>,
    pub name: Option<String>,
    pub polygons: Vec<Polygon>,
}

/// Read-only set of named boundary regions.
///
/// Regions that share an id are merged (their polygons appended in input
/// order), so a lookup by id always covers every shape of that region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryDataset {
    regions: Vec<Region>,
    by_id: HashMap<RegionId, usize>,
}

impl BoundaryDataset {
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        let mut out = Self::default();
        for region in regions {
            out.push(region);
        }
        out
    }

    fn push(&mut self, region: Region) {
        if let Some(id) = region.id
            && let Some(&existing) = self.by_id.get(&id)
        {
            tracing::debug!(region = %id, "merging polygons of duplicate region");
            let target = &mut self.regions[existing];
            if target.name.is_none() {
                target.name = region.name;
            }
            target.polygons.extend(region.polygons);
            return;
        }
        if let Some(id) = region.id {
            self.by_id.insert(id, self.regions.len());
        }
        self.regions.push(region);
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.by_id.get(&id).map(|&i| &self.regions[i])
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Total polygon count, used for logging.
    pub fn polygon_count(&self) -> usize {
        self.regions.iter().map(|r| r.polygons.len()).sum()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{BoundaryDataset, Polygon, Region};
    use foundation::ids::RegionId;

    pub fn square(lon0: f64, lat0: f64, size: f64) -> Polygon {
        Polygon::new(vec![vec![
            [lon0, lat0],
            [lon0 + size, lat0],
            [lon0 + size, lat0 + size],
            [lon0, lat0 + size],
            [lon0, lat0],
        ]])
    }

    pub fn region(id: u32, polygons: Vec<Polygon>) -> Region {
        Region {
            id: Some(RegionId(id)),
            name: Some(format!("region-{id}")),
            polygons,
        }
    }

    /// Two separate squares and a square with a hole.
    pub fn small_world() -> BoundaryDataset {
        let mut holed = square(-60.0, -30.0, 40.0);
        holed.rings.push(vec![
            [-50.0, -20.0],
            [-30.0, -20.0],
            [-30.0, 0.0],
            [-50.0, 0.0],
        ]);
        BoundaryDataset::new(vec![
            region(4, vec![square(0.0, 0.0, 20.0)]),
            region(76, vec![holed]),
            region(840, vec![square(100.0, 30.0, 25.0)]),
        ])
    }
}

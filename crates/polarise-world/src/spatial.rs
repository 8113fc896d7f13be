//! Uniform-grid spatial hash for neighbour queries.
//!
//! Agents are bucketed by the 3D cell containing their position. A query
//! visits every cell overlapping the query sphere's bounding box and yields
//! candidate indices; callers still filter by exact distance.

use std::collections::HashMap;

use glam::{IVec3, Vec3};

/// Spatial hash over agent indices.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
    len: usize,
}

impl SpatialHash {
    /// Create an empty hash. Non-positive cell sizes are clamped to 1.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Edge length of a cell.
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of indexed entries.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is indexed.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry, keeping allocated buckets.
    pub fn clear(&mut self) {
        self.cells.values_mut().for_each(Vec::clear);
        self.len = 0;
    }

    fn cell_of(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }

    /// Index `index` at `position`.
    pub fn insert(&mut self, index: usize, position: Vec3) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(index);
        self.len = self.len.saturating_add(1);
    }

    /// Rebuild from scratch with entry `i` at `positions[i]`.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec3>,
    {
        self.clear();
        for (index, position) in positions.into_iter().enumerate() {
            self.insert(index, position);
        }
    }

    /// Call `visit` for every candidate within `radius` of `position`.
    pub fn for_each_candidate(&self, position: Vec3, radius: f32, mut visit: impl FnMut(usize)) {
        let min = self.cell_of(position - Vec3::splat(radius));
        let max = self.cell_of(position + Vec3::splat(radius));
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    if let Some(bucket) = self.cells.get(&IVec3::new(x, y, z)) {
                        bucket.iter().copied().for_each(&mut visit);
                    }
                }
            }
        }
    }

    /// Collect candidates within `radius` of `position` into `out`.
    pub fn candidates(&self, position: Vec3, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        self.for_each_candidate(position, radius, |index| out.push(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_neighbours_across_cell_borders() {
        let mut hash = SpatialHash::new(2.0);
        hash.rebuild([
            Vec3::new(0.1, 0.1, 0.1),
            Vec3::new(-0.1, 0.1, 0.1),
            Vec3::new(10.0, 10.0, 10.0),
        ]);
        let mut out = Vec::new();
        hash.candidates(Vec3::new(0.0, 0.1, 0.1), 0.5, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1]);
        assert_eq!(hash.len(), 3);
    }

    #[test]
    fn clear_empties_without_dropping_buckets() {
        let mut hash = SpatialHash::new(1.0);
        hash.insert(0, Vec3::ZERO);
        hash.clear();
        assert!(hash.is_empty());
        let mut out = Vec::new();
        hash.candidates(Vec3::ZERO, 1.0, &mut out);
        assert!(out.is_empty());
    }
}

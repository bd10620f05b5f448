//! Spatial hashing for efficient neighbor search.
//!
//! Particles are bucketed by the hash of their grid cell (cell size = h) and
//! sorted by key, so every cell's particles form one contiguous run. A query
//! walks the 3^DIM cells around a point and visits each run. The table has
//! exactly N keys, one per particle.
//!
//! Hash collisions only add candidates: distinct cells may share a key, so
//! callers must re-check the true distance. Completeness holds because every
//! particle within h of the query lies in one of the scanned cells.

use bevy::prelude::*;
use rayon::prelude::*;

use super::vector::{FluidVector, MAX_NEIGHBOR_CELLS};

/// Marks a key with no particles in `cell_start`.
pub const ABSENT: u32 = u32::MAX;

/// One particle's slot in the sorted entry list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridEntry {
    pub particle_index: u32,
    pub cell_key: u32,
}

/// Hashed uniform grid rebuilt from scratch every substep.
#[derive(Clone, Debug, Default)]
pub struct SpatialHashGrid {
    cell_size: f32,
    /// Sorted by `cell_key`, ties by `particle_index`.
    entries: Vec<GridEntry>,
    /// First index in `entries` for each key, or [`ABSENT`].
    cell_start: Vec<u32>,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            ..default()
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Changes the cell size. Takes effect on the next rebuild.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
    }

    /// Number of particles indexed by the last rebuild.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    pub fn cell_start(&self) -> &[u32] {
        &self.cell_start
    }

    /// Table key of the cell containing `position`.
    pub fn key_of<V: FluidVector>(&self, position: V) -> Option<u32> {
        self.key_of_cell::<V>(position.cell_of(self.cell_size))
    }

    #[inline]
    fn key_of_cell<V: FluidVector>(&self, cell: V::Cell) -> Option<u32> {
        let table_size = self.entries.len() as u32;
        (table_size > 0).then(|| V::hash_cell(cell) % table_size)
    }

    /// Re-indexes the grid from `positions`. An empty slice clears it.
    pub fn rebuild<V: FluidVector>(&mut self, positions: &[V]) {
        let table_size = positions.len() as u32;
        let cell_size = self.cell_size;

        positions
            .par_iter()
            .enumerate()
            .map(|(i, &position)| GridEntry {
                particle_index: i as u32,
                cell_key: V::hash_cell(position.cell_of(cell_size)) % table_size.max(1),
            })
            .collect_into_vec(&mut self.entries);

        self.entries
            .par_sort_unstable_by_key(|entry| (entry.cell_key, entry.particle_index));

        let entries = &self.entries;
        let run_starts: Vec<(u32, u32)> = entries
            .par_iter()
            .enumerate()
            .filter(|&(i, entry)| i == 0 || entries[i - 1].cell_key != entry.cell_key)
            .map(|(i, entry)| (entry.cell_key, i as u32))
            .collect();

        self.cell_start.clear();
        self.cell_start.resize(positions.len(), ABSENT);
        for (key, start) in run_starts {
            self.cell_start[key as usize] = start;
        }
    }

    /// Calls `visit` with every particle in the cells around `position`.
    ///
    /// Keys shared by several neighboring cells are scanned once, so each
    /// candidate index is reported at most once per query.
    pub fn for_each_candidate<V: FluidVector>(&self, position: V, mut visit: impl FnMut(usize)) {
        let origin = position.cell_of(self.cell_size);
        let mut seen = [ABSENT; MAX_NEIGHBOR_CELLS];
        let mut seen_len = 0;

        for &offset in V::neighbor_offsets() {
            let Some(key) = self.key_of_cell::<V>(V::offset_cell(origin, offset)) else {
                return;
            };
            if seen[..seen_len].contains(&key) {
                continue;
            }
            seen[seen_len] = key;
            seen_len += 1;

            let start = self.cell_start[key as usize];
            if start == ABSENT {
                continue;
            }
            for entry in &self.entries[start as usize..] {
                if entry.cell_key != key {
                    break;
                }
                visit(entry.particle_index as usize);
            }
        }
    }

    /// Candidate indices around `position` (may include false positives).
    pub fn neighbors_of<V: FluidVector>(&self, position: V) -> Vec<usize> {
        let mut neighbors = Vec::new();
        self.for_each_candidate(position, |i| neighbors.push(i));
        neighbors
    }

    /// Indices and distances of particles strictly closer than `radius`.
    ///
    /// Only the cells adjacent to `position` are scanned, so `radius` must
    /// not exceed the cell size.
    pub fn neighbors_within<V: FluidVector>(
        &self,
        position: V,
        positions: &[V],
        radius: f32,
    ) -> Vec<(usize, f32)> {
        debug_assert!(
            radius <= self.cell_size,
            "query radius {radius} exceeds cell size {}",
            self.cell_size
        );
        let radius_sq = radius * radius;
        let mut neighbors = Vec::new();
        self.for_each_candidate(position, |i| {
            let dst_sq = (positions[i] - position).length_squared();
            if dst_sq < radius_sq {
                neighbors.push((i, dst_sq.sqrt()));
            }
        });
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_positions<V: FluidVector>(count: usize, extent: f32, seed: u64) -> Vec<V> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let mut p = V::ZERO;
                for axis in 0..V::DIM {
                    p.set_axis(axis, rng.gen_range(-extent..extent));
                }
                p
            })
            .collect()
    }

    fn brute_force<V: FluidVector>(position: V, positions: &[V], radius: f32) -> Vec<usize> {
        positions
            .iter()
            .enumerate()
            .filter(|(_, &p)| (p - position).length_squared() < radius * radius)
            .map(|(i, _)| i)
            .collect()
    }

    fn assert_complete<V: FluidVector>(count: usize, extent: f32, h: f32, seed: u64) {
        let positions = random_positions::<V>(count, extent, seed);
        let mut grid = SpatialHashGrid::new(h);
        grid.rebuild(&positions);

        for &query in &positions {
            let mut found: Vec<usize> = grid
                .neighbors_within(query, &positions, h)
                .into_iter()
                .map(|(i, _)| i)
                .collect();
            found.sort_unstable();
            assert_eq!(found, brute_force(query, &positions, h));
        }
    }

    #[test]
    fn test_grid_matches_brute_force_2d() {
        assert_complete::<Vec2>(400, 3.0, 0.5, 1);
        assert_complete::<Vec2>(50, 10.0, 0.5, 2);
    }

    #[test]
    fn test_grid_matches_brute_force_3d() {
        assert_complete::<Vec3>(300, 2.0, 0.5, 3);
        assert_complete::<Vec3>(40, 5.0, 0.7, 4);
    }

    #[test]
    fn test_entries_sorted_and_runs_indexed() {
        let positions = random_positions::<Vec2>(200, 4.0, 5);
        let mut grid = SpatialHashGrid::new(0.5);
        grid.rebuild(&positions);

        let entries = grid.entries();
        assert_eq!(entries.len(), 200);
        assert!(entries.windows(2).all(|w| w[0].cell_key <= w[1].cell_key));

        for (key, &start) in grid.cell_start().iter().enumerate() {
            if start == ABSENT {
                assert!(entries.iter().all(|e| e.cell_key != key as u32));
            } else {
                let start = start as usize;
                assert_eq!(entries[start].cell_key, key as u32);
                assert!(start == 0 || entries[start - 1].cell_key != key as u32);
            }
        }

        for entry in entries {
            let position = positions[entry.particle_index as usize];
            assert_eq!(grid.key_of(position), Some(entry.cell_key));
        }
    }

    #[test]
    fn test_colliding_keys_reported_once() {
        // With three particles every neighbor cell maps into three keys.
        let positions = vec![Vec2::ZERO, Vec2::new(0.1, 0.0), Vec2::new(0.0, 0.1)];
        let mut grid = SpatialHashGrid::new(0.5);
        grid.rebuild(&positions);

        let mut candidates = grid.neighbors_of(Vec2::ZERO);
        candidates.sort_unstable();
        assert_eq!(candidates, vec![0, 1, 2]);
    }

    #[test]
    fn test_coincident_particles_found() {
        let positions = vec![Vec3::ONE; 4];
        let mut grid = SpatialHashGrid::new(0.5);
        grid.rebuild(&positions);

        let found = grid.neighbors_within(Vec3::ONE, &positions, 0.5);
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|&(_, dst)| dst == 0.0));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let positions = random_positions::<Vec3>(500, 3.0, 6);
        let mut a = SpatialHashGrid::new(0.4);
        let mut b = SpatialHashGrid::new(0.4);
        a.rebuild(&positions);
        b.rebuild(&positions);
        assert_eq!(a.entries(), b.entries());
        assert_eq!(a.cell_start(), b.cell_start());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds cell size")]
    fn test_neighbors_within_rejects_radius_beyond_cell() {
        let positions = vec![Vec2::ZERO, Vec2::new(0.4, 0.0)];
        let mut grid = SpatialHashGrid::new(0.5);
        grid.rebuild(&positions);
        grid.neighbors_within(Vec2::ZERO, &positions, 1.5);
    }

    #[test]
    fn test_empty_grid() {
        let mut grid = SpatialHashGrid::new(0.5);
        grid.rebuild::<Vec2>(&[]);
        assert!(grid.is_empty());
        assert!(grid.neighbors_of(Vec2::ZERO).is_empty());
        assert_eq!(grid.key_of(Vec2::ZERO), None);
    }
}

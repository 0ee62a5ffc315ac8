//! Uniform cell index for exact nearest-point queries.
//!
//! Points are bucketed into cubic cells over their own bounding box. A query
//! scans Chebyshev shells of cells around the query cell and stops once the
//! next shell cannot hold anything closer than the best hit so far.

use crate::coord::{BoundingBox, Coord};

/// Default cell edge for indexing cavity coordinates, in angstroms.
pub const DEFAULT_CELL_SIZE: f64 = 2.0;

#[derive(Debug)]
pub struct PointIndex {
	points: Vec<Coord>,
	origin: Coord,
	cell_size: f64,
	dims: [usize; 3],
	/// Point indices per cell, X fastest
	cells: Vec<Vec<usize>>,
}

impl PointIndex {
	/// Build an index over `points`; `None` when there are no points.
	///
	/// # Panics
	///
	/// Panics if `cell_size <= 0.0`.
	pub fn new(points: Vec<Coord>, cell_size: f64) -> Option<Self> {
		assert!(cell_size > 0.0, "cell size must be positive");
		let bounds = BoundingBox::from_coords(&points)?;
		let span = bounds.extent();
		let dims = [
			(span.x / cell_size).floor() as usize + 1,
			(span.y / cell_size).floor() as usize + 1,
			(span.z / cell_size).floor() as usize + 1,
		];
		let mut index = Self {
			points: Vec::new(),
			origin: bounds.min,
			cell_size,
			dims,
			cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
		};
		for (idx, p) in points.iter().enumerate() {
			let cell = index.cell_of(p);
			let slot = index.cell_slot(cell);
			index.cells[slot].push(idx);
		}
		index.points = points;
		Some(index)
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	/// Cell holding `p`, possibly outside the occupied range
	fn cell_of(&self, p: &Coord) -> [isize; 3] {
		[
			((p.x - self.origin.x) / self.cell_size).floor() as isize,
			((p.y - self.origin.y) / self.cell_size).floor() as isize,
			((p.z - self.origin.z) / self.cell_size).floor() as isize,
		]
	}

	#[inline]
	fn cell_slot(&self, cell: [isize; 3]) -> usize {
		let clamp = |v: isize, len: usize| v.clamp(0, len as isize - 1) as usize;
		let i = clamp(cell[0], self.dims[0]);
		let j = clamp(cell[1], self.dims[1]);
		let k = clamp(cell[2], self.dims[2]);
		i + j * self.dims[0] + k * self.dims[0] * self.dims[1]
	}

	/// Squared distance from `q` to the closest indexed point.
	pub fn nearest_dist2(&self, q: &Coord) -> f64 {
		let center = self.cell_of(q);

		// Furthest shell that can still intersect the occupied cells.
		let mut max_shell = 0isize;
		for axis in 0..3 {
			let hi = self.dims[axis] as isize - 1;
			max_shell = max_shell.max(center[axis].abs()).max((center[axis] - hi).abs());
		}

		let mut best = f64::INFINITY;
		for shell in 0..=max_shell {
			if shell >= 1 {
				// every cell in this shell is at least (shell - 1) cells away
				let reach = (shell - 1) as f64 * self.cell_size;
				if best <= reach * reach {
					break;
				}
			}
			self.scan_shell(q, center, shell, &mut best);
		}
		best
	}

	/// Distance from `q` to the closest indexed point.
	#[inline]
	pub fn nearest_dist(&self, q: &Coord) -> f64 {
		self.nearest_dist2(q).sqrt()
	}

	fn scan_shell(&self, q: &Coord, center: [isize; 3], shell: isize, best: &mut f64) {
		let range = |axis: usize| {
			let lo = (center[axis] - shell).max(0);
			let hi = (center[axis] + shell).min(self.dims[axis] as isize - 1);
			lo..=hi
		};
		for k in range(2) {
			let k_on_shell = (k - center[2]).abs() == shell;
			for j in range(1) {
				if k_on_shell || (j - center[1]).abs() == shell {
					for i in range(0) {
						self.scan_cell([i, j, k], q, best);
					}
				} else {
					// only the two end caps of this row lie on the shell
					let hi_i = self.dims[0] as isize - 1;
					let lo = center[0] - shell;
					let hi = center[0] + shell;
					if (0..=hi_i).contains(&lo) {
						self.scan_cell([lo, j, k], q, best);
					}
					if shell > 0 && (0..=hi_i).contains(&hi) {
						self.scan_cell([hi, j, k], q, best);
					}
				}
			}
		}
	}

	#[inline]
	fn scan_cell(&self, cell: [isize; 3], q: &Coord, best: &mut f64) {
		let slot = cell[0] as usize
			+ cell[1] as usize * self.dims[0]
			+ cell[2] as usize * self.dims[0] * self.dims[1];
		for &idx in &self.cells[slot] {
			let d2 = q.dist2(&self.points[idx]);
			if d2 < *best {
				*best = d2;
			}
		}
	}
}

/// Brute-force minimum distance from `q` to any of `points`.
pub fn min_distance(q: &Coord, points: &[Coord]) -> Option<f64> {
	points
		.iter()
		.map(|p| q.dist2(p))
		.min_by(|a, b| a.total_cmp(b))
		.map(f64::sqrt)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Deterministic scatter of points without pulling in a RNG.
	fn scatter(n: usize, scale: f64) -> Vec<Coord> {
		(0..n)
			.map(|i| {
				let t = i as f64;
				Coord::new(
					(t * 1.618).sin() * scale,
					(t * 2.414).cos() * scale,
					(t * 0.577).sin() * (t * 0.3).cos() * scale,
				)
			})
			.collect()
	}

	#[test]
	fn empty_input_gives_no_index() {
		assert!(PointIndex::new(Vec::new(), 1.0).is_none());
	}

	#[test]
	fn matches_brute_force_inside_and_outside() {
		let points = scatter(200, 6.0);
		let index = PointIndex::new(points.clone(), DEFAULT_CELL_SIZE).unwrap();
		for q in scatter(150, 15.0).iter().chain(points.iter().take(10)) {
			let expected = min_distance(q, &points).unwrap();
			let got = index.nearest_dist(q);
			assert!((expected - got).abs() < 1e-9, "query {} expected {} got {}", q, expected, got);
		}
	}

	#[test]
	fn single_point_index() {
		let index = PointIndex::new(vec![Coord::new(1.0, 1.0, 1.0)], 0.5).unwrap();
		assert_eq!(index.len(), 1);
		assert!((index.nearest_dist(&Coord::new(4.0, 5.0, 1.0)) - 5.0).abs() < 1e-12);
		assert_eq!(index.nearest_dist(&Coord::new(1.0, 1.0, 1.0)), 0.0);
	}
}

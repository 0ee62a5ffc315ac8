use std::mem::size_of;

use crate::coord::Coord;
use crate::voxel_grid::grid::RealGrid;

/// Format large numbers with KB, MB, GB, TB suffixes
pub fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;
	const TB: usize = GB * 1024;

	if bytes >= TB {
		format!("{:.2} TB", bytes as f64 / TB as f64)
	} else if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

impl RealGrid {
	/// Bytes held by the grid, struct plus voxel buffer
	pub fn memory_bytes(&self) -> usize {
		size_of::<Self>() + self.data.capacity() * size_of::<f32>()
	}

	/// Log dimensions and memory usage at debug level
	pub fn report_memory(&self) {
		log::debug!(
			"RealGrid {} x {} x {} ({:e} voxels) at {:.3} A, {}",
			self.len_i,
			self.len_j,
			self.len_k,
			self.total_voxels as f64,
			self.grid_size,
			format_bytes(self.memory_bytes())
		);
	}

	/// Convert (i, j, k) to a linear index
	#[inline]
	pub fn ijk_to_index(&self, i: usize, j: usize, k: usize) -> usize {
		i + j * self.len_i + k * self.len_i * self.len_j
	}

	/// Convert a linear index back to (i, j, k)
	#[inline]
	pub fn index_to_ijk(&self, index: usize) -> (usize, usize, usize) {
		let k = index / (self.len_i * self.len_j);
		let j = (index % (self.len_i * self.len_j)) / self.len_i;
		let i = index % self.len_i;
		(i, j, k)
	}

	/// Real-world position of grid point (i, j, k)
	#[inline]
	pub fn ijk_to_coord(&self, i: usize, j: usize, k: usize) -> Coord {
		Coord::new(
			self.min_coord.x + i as f64 * self.grid_size,
			self.min_coord.y + j as f64 * self.grid_size,
			self.min_coord.z + k as f64 * self.grid_size,
		)
	}

	/// Real-world position of the voxel at a linear index
	#[inline]
	pub fn index_to_coord(&self, index: usize) -> Coord {
		let (i, j, k) = self.index_to_ijk(index);
		self.ijk_to_coord(i, j, k)
	}

	/// True if `c` lies inside the region covered by the grid
	#[inline]
	pub fn is_valid(&self, c: &Coord) -> bool {
		self.bounds().contains(c)
	}

	/// Nearest grid point to `c`, or `None` outside the grid region
	pub fn nearest_ijk(&self, c: &Coord) -> Option<(usize, usize, usize)> {
		if !self.is_valid(c) {
			return None;
		}
		let snap = |v: f64, lo: f64, len: usize| -> usize {
			let idx = ((v - lo) / self.grid_size).round() as usize;
			idx.min(len - 1)
		};
		Some((
			snap(c.x, self.min_coord.x, self.len_i),
			snap(c.y, self.min_coord.y, self.len_j),
			snap(c.z, self.min_coord.z, self.len_k),
		))
	}

	/// Linear index of the nearest grid point to `c`
	#[inline]
	pub fn nearest_index(&self, c: &Coord) -> Option<usize> {
		self.nearest_ijk(c).map(|(i, j, k)| self.ijk_to_index(i, j, k))
	}

	/// Get a voxel value by linear index (panics if out of bounds)
	#[inline]
	pub fn get_value_index(&self, index: usize) -> f32 {
		self.data[index]
	}

	/// Get a voxel value using (i, j, k) coordinates
	#[inline]
	pub fn get_value_ijk(&self, i: usize, j: usize, k: usize) -> f32 {
		self.get_value_index(self.ijk_to_index(i, j, k))
	}

	/// Value of the voxel nearest to `c`, `None` outside the grid
	#[inline]
	pub fn get_value(&self, c: &Coord) -> Option<f32> {
		self.nearest_index(c).map(|idx| self.data[idx])
	}

	/// Set a voxel value by linear index (panics if out of bounds)
	#[inline]
	pub fn set_value_index(&mut self, index: usize, value: f32) {
		self.data[index] = value;
	}

	/// Set the voxel nearest to `c`; returns false if `c` is outside the grid
	pub fn set_value(&mut self, c: &Coord, value: f32) -> bool {
		match self.nearest_index(c) {
			Some(idx) => {
				self.data[idx] = value;
				true
			}
			None => false,
		}
	}

	/// Smallest and largest voxel values
	pub fn value_range(&self) -> Option<(f32, f32)> {
		let mut iter = self.data.iter().copied();
		let first = iter.next()?;
		Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
	}

	/// Mean voxel value, zero for an empty grid
	pub fn mean_value(&self) -> f64 {
		if self.data.is_empty() {
			return 0.0;
		}
		self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_grid() -> RealGrid {
		RealGrid::new(
			5,
			4,
			3,
			0.5,
			Coord::new(-1.0, 0.0, 2.0),
			Coord::new(1.0, 1.5, 3.0),
			0.0,
		)
	}

	#[test]
	fn index_conversion_is_consistent() {
		let grid = sample_grid();
		for idx in 0..grid.total_voxels {
			let (i, j, k) = grid.index_to_ijk(idx);
			assert_eq!(grid.ijk_to_index(i, j, k), idx);
		}
	}

	#[test]
	fn nearest_voxel_rounds_to_closest_point() {
		let grid = sample_grid();
		assert_eq!(grid.nearest_ijk(&Coord::new(-1.0, 0.0, 2.0)), Some((0, 0, 0)));
		assert_eq!(grid.nearest_ijk(&Coord::new(-0.7, 0.3, 2.9)), Some((1, 1, 2)));
		assert_eq!(grid.nearest_ijk(&Coord::new(1.0, 1.5, 3.0)), Some((4, 3, 2)));
		assert_eq!(grid.nearest_ijk(&Coord::new(1.01, 0.0, 2.0)), None);
	}

	#[test]
	fn set_and_get_by_coordinate() {
		let mut grid = sample_grid();
		assert!(grid.set_value(&Coord::new(0.0, 0.5, 2.5), 7.5));
		assert_eq!(grid.get_value_ijk(2, 1, 1), 7.5);
		assert_eq!(grid.get_value(&Coord::new(0.1, 0.4, 2.6)), Some(7.5));
		assert!(!grid.set_value(&Coord::new(5.0, 0.0, 0.0), 1.0));
		assert_eq!(grid.value_range(), Some((0.0, 7.5)));
	}

	#[test]
	fn grid_point_positions() {
		let grid = sample_grid();
		assert_eq!(grid.ijk_to_coord(4, 3, 2), Coord::new(1.0, 1.5, 3.0));
		let idx = grid.ijk_to_index(2, 1, 0);
		assert_eq!(grid.index_to_coord(idx), Coord::new(0.0, 0.5, 2.0));
	}

	#[test]
	fn bytes_are_humanized() {
		assert_eq!(format_bytes(512), "512 bytes");
		assert_eq!(format_bytes(2048), "2.00 KB");
		assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
	}
}

use std::thread;

use indicatif::{ProgressBar, ProgressStyle};

use crate::coord::Coord;
use crate::voxel_grid::grid::RealGrid;
use crate::voxel_grid::spatial::PointIndex;

fn progress_bar(len: u64, show: bool) -> ProgressBar {
	if !show {
		return ProgressBar::hidden();
	}
	let pb = ProgressBar::new(len);
	let style = ProgressStyle::with_template("Distance grid: [{bar:40.cyan/blue}] {pos}/{len} slabs ({eta})")
		.map(|s| s.progress_chars("#>-"))
		.unwrap_or_else(|_| ProgressStyle::default_bar());
	pb.set_style(style);
	pb
}

impl RealGrid {
	/// Fill every voxel with the distance from its grid point to the nearest
	/// indexed point, in parallel over Z slabs.
	pub fn fill_nearest_distance_parallel(&mut self, index: &PointIndex, show_progress: bool) {
		if index.is_empty() || self.total_voxels == 0 {
			return;
		}

		let slab = self.len_i * self.len_j;
		let len_k = self.len_k;

		let threads = thread::available_parallelism()
			.map(|n| n.get())
			.unwrap_or(1);
		// whole slabs per worker so each chunk starts at i = j = 0
		let slabs_per_chunk = len_k.div_ceil(threads);
		let chunk_size = slabs_per_chunk * slab;

		let pb = progress_bar(len_k as u64, show_progress);
		let len_i = self.len_i;
		let grid_size = self.grid_size;
		let origin = self.min_coord;
		let mut data = std::mem::take(&mut self.data);

		thread::scope(|scope| {
			for (chunk_idx, chunk) in data.chunks_mut(chunk_size).enumerate() {
				let pb = pb.clone();
				scope.spawn(move || {
					let k0 = chunk_idx * slabs_per_chunk;
					for (slab_idx, slab_values) in chunk.chunks_mut(slab).enumerate() {
						let z = origin.z + (k0 + slab_idx) as f64 * grid_size;
						for (offset, value) in slab_values.iter_mut().enumerate() {
							let i = offset % len_i;
							let j = offset / len_i;
							let p = Coord::new(
								origin.x + i as f64 * grid_size,
								origin.y + j as f64 * grid_size,
								z,
							);
							*value = index.nearest_dist(&p) as f32;
						}
						pb.inc(1);
					}
				});
			}
		});

		pb.finish_and_clear();
		self.data = data;
	}
}

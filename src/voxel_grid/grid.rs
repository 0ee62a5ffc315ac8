use crate::coord::{BoundingBox, Coord};

/// 3D scalar grid with one `f32` per voxel
///
/// Grid point (i, j, k) sits at `min_coord + (i, j, k) * grid_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct RealGrid {
	pub len_i: usize,  // Number of voxels along X
	pub len_j: usize,  // Number of voxels along Y
	pub len_k: usize,  // Number of voxels along Z
	pub total_voxels: usize, // Total number of voxels IxJxK
	pub grid_size: f64,  // Voxel spacing in angstroms
	pub min_coord: Coord,  // Lower corner of the covered region, at voxel (0,0,0)
	pub max_coord: Coord,  // Upper corner of the covered region
	pub data: Vec<f32>,  // Voxel values, I fastest
}

impl RealGrid {
	/// Create a new grid, fully allocated with every voxel set to `fill`
	pub fn new(
		len_i: usize,
		len_j: usize,
		len_k: usize,
		grid_size: f64,
		min_coord: Coord,
		max_coord: Coord,
		fill: f32,
	) -> Self {
		let total_voxels = len_i * len_j * len_k;

		Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			grid_size,
			min_coord,
			max_coord,
			data: vec![fill; total_voxels],
		}
	}

	/// Region covered by the grid
	pub fn bounds(&self) -> BoundingBox {
		BoundingBox {
			min: self.min_coord,
			max: self.max_coord,
		}
	}
}

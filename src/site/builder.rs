use std::time::Instant;

use crate::coord::{BoundingBox, Coord};
use crate::error::{Result, SiteError};
use crate::site::cavity::Cavity;
use crate::voxel_grid::geometry::{GridConfig, GridParams};
use crate::voxel_grid::grid::RealGrid;
use crate::voxel_grid::spatial::{PointIndex, DEFAULT_CELL_SIZE};

/// Builds the nearest-cavity-coordinate distance grid for a set of cavities.
#[derive(Debug, Clone)]
pub struct DistanceFieldBuilder {
	border: f64,
	config: GridConfig,
}

/// All cavity coordinates, cavity order then per-cavity order.
pub fn collect_coords(cavities: &[Cavity]) -> Vec<Coord> {
	let total: usize = cavities.iter().map(Cavity::num_coords).sum();
	let mut coords = Vec::with_capacity(total);
	for cavity in cavities {
		coords.extend_from_slice(cavity.coords());
	}
	coords
}

/// Bounding box over every coordinate of every cavity.
pub fn cavity_bounds(cavities: &[Cavity]) -> Result<BoundingBox> {
	let coords = cavities.iter().flat_map(Cavity::coords);
	if let Some(c) = coords.clone().find(|c| !c.is_finite()) {
		return Err(SiteError::InvalidGrid(format!("cavity coordinate {} is not finite", c)));
	}
	BoundingBox::from_coords(coords).ok_or(SiteError::EmptyCavityInput)
}

impl DistanceFieldBuilder {
	pub fn new(border: f64, config: GridConfig) -> Self {
		Self { border, config }
	}

	pub fn border(&self) -> f64 {
		self.border
	}

	pub fn config(&self) -> &GridConfig {
		&self.config
	}

	/// Grid over the cavities' bounding box grown by the border, each voxel
	/// holding the distance to the nearest cavity coordinate.
	pub fn build(&self, cavities: &[Cavity]) -> Result<RealGrid> {
		let bounds = cavity_bounds(cavities)?;
		let params = GridParams::from_bounds(&bounds, self.border, self.config.step)?;
		let coords = collect_coords(cavities);
		let n_coords = coords.len();
		let index = PointIndex::new(coords, DEFAULT_CELL_SIZE.max(self.config.step))
			.ok_or(SiteError::EmptyCavityInput)?;

		log::info!(
			"Building distance grid {} x {} x {} ({} voxels) from {} cavity coords, border {:.2} A, step {:.2} A",
			params.len_i,
			params.len_j,
			params.len_k,
			params.total_voxels(),
			n_coords,
			self.border,
			self.config.step
		);
		let start_time = Instant::now();

		let mut grid = params.build_grid(f32::MAX);
		grid.fill_nearest_distance_parallel(&index, self.config.show_progress);

		log::info!("Distance grid built in {:.3} s", start_time.elapsed().as_secs_f64());
		grid.report_memory();
		Ok(grid)
	}
}

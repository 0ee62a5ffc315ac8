use crate::coord::{BoundingBox, Coord};
use crate::error::{Result, SiteError};
use crate::voxel_grid::grid::RealGrid;

/// Default voxel spacing for distance grids, in angstroms.
pub const DEFAULT_GRID_STEP: f64 = 0.5;

/// Largest grid the builder will allocate, in voxels (4 GiB of `f32`).
pub const MAX_GRID_VOXELS: usize = 1 << 30;

/// Per-site grid settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
	/// Voxel spacing in angstroms
	pub step: f64,
	/// Draw a progress bar while populating the grid
	pub show_progress: bool,
}

impl Default for GridConfig {
	fn default() -> Self {
		Self {
			step: DEFAULT_GRID_STEP,
			show_progress: false,
		}
	}
}

impl GridConfig {
	pub fn with_step(step: f64) -> Self {
		Self {
			step,
			..Self::default()
		}
	}

	pub fn validate(&self) -> Result<()> {
		if !self.step.is_finite() || self.step <= 0.0 {
			return Err(SiteError::InvalidGrid(format!(
				"grid step must be positive and finite, got {}",
				self.step
			)));
		}
		Ok(())
	}
}

/// Grid placement derived from a bounding box, border and spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct GridParams {
	pub min: Coord,
	pub max: Coord,
	pub len_i: usize,
	pub len_j: usize,
	pub len_k: usize,
	pub grid: f64,
}

impl GridParams {
	/// Expand `bounds` by `border` on every face and lay a lattice of
	/// spacing `step` over the result.
	pub fn from_bounds(bounds: &BoundingBox, border: f64, step: f64) -> Result<Self> {
		if !border.is_finite() || border < 0.0 {
			return Err(SiteError::InvalidGrid(format!(
				"border must be non-negative and finite, got {}",
				border
			)));
		}
		GridConfig::with_step(step).validate()?;

		let expanded = bounds.expanded(border);
		if !expanded.min.is_finite() || !expanded.max.is_finite() {
			return Err(SiteError::InvalidGrid(format!(
				"grid bounds {} - {} are not finite",
				expanded.min, expanded.max
			)));
		}
		let span = expanded.extent();
		let dims = lattice_dims(&span, step).ok_or_else(|| {
			SiteError::InvalidGrid(format!(
				"a {:.3} x {:.3} x {:.3} A box at step {} exceeds {} voxels",
				span.x, span.y, span.z, step, MAX_GRID_VOXELS
			))
		})?;

		Ok(Self {
			min: expanded.min,
			max: expanded.max,
			len_i: dims[0],
			len_j: dims[1],
			len_k: dims[2],
			grid: step,
		})
	}

	pub fn total_voxels(&self) -> usize {
		self.len_i * self.len_j * self.len_k
	}

	/// Instantiate a `RealGrid` using these parameters.
	pub fn build_grid(&self, fill: f32) -> RealGrid {
		RealGrid::new(
			self.len_i,
			self.len_j,
			self.len_k,
			self.grid,
			self.min,
			self.max,
			fill,
		)
	}
}

/// Number of grid points needed to cover `span` at spacing `step`,
/// `None` if that exceeds `MAX_GRID_VOXELS`
pub fn calculate_dimension(span: f64, step: f64) -> Option<usize> {
	// absorb rounding noise so an exact multiple does not gain a voxel
	let cells = (span / step - 1e-9).ceil().max(0.0);
	if !cells.is_finite() || cells >= MAX_GRID_VOXELS as f64 {
		return None;
	}
	Some(cells as usize + 1)
}

/// Points per axis for a box of extent `span`, `None` if the grid would be too large
pub fn lattice_dims(span: &Coord, step: f64) -> Option<[usize; 3]> {
	let dims = [
		calculate_dimension(span.x, step)?,
		calculate_dimension(span.y, step)?,
		calculate_dimension(span.z, step)?,
	];
	let total = dims[0].checked_mul(dims[1])?.checked_mul(dims[2])?;
	(total <= MAX_GRID_VOXELS).then_some(dims)
}

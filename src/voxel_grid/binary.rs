use std::io::{Read, Write};

use crate::coord::BoundingBox;
use crate::error::{Result, SiteError};
use crate::stream;
use crate::voxel_grid::geometry::lattice_dims;
use crate::voxel_grid::grid::RealGrid;

const GRID_TAG: &str = "RealGrid";

impl RealGrid {
	/// Write bounds, spacing, dimensions and the raw voxel buffer
	pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
		stream::write_tag(w, GRID_TAG)?;
		stream::write_coord(w, &self.min_coord)?;
		stream::write_coord(w, &self.max_coord)?;
		stream::write_f64(w, self.grid_size)?;
		stream::write_len(w, self.len_i, "grid dimension")?;
		stream::write_len(w, self.len_j, "grid dimension")?;
		stream::write_len(w, self.len_k, "grid dimension")?;
		stream::write_f32_buffer(w, &self.data)
	}

	/// Read a grid written by [`RealGrid::write`]
	pub fn read<R: Read>(r: &mut R) -> Result<Self> {
		stream::expect_tag(r, GRID_TAG)?;
		let min_coord = stream::read_coord(r, "grid min coord")?;
		let max_coord = stream::read_coord(r, "grid max coord")?;
		let grid_size = stream::read_f64(r, "grid step")?;
		let len_i = stream::read_u32(r, "grid dimensions")? as usize;
		let len_j = stream::read_u32(r, "grid dimensions")? as usize;
		let len_k = stream::read_u32(r, "grid dimensions")? as usize;

		if !min_coord.is_finite() || !max_coord.is_finite() {
			return Err(SiteError::malformed("grid bounds are not finite"));
		}
		if BoundingBox::new(min_coord, max_coord).is_none() {
			return Err(SiteError::malformed(format!(
				"grid min {} exceeds max {}",
				min_coord, max_coord
			)));
		}
		if !grid_size.is_finite() || grid_size <= 0.0 {
			return Err(SiteError::malformed(format!("grid step {} is not positive", grid_size)));
		}
		if len_i == 0 || len_j == 0 || len_k == 0 {
			return Err(SiteError::malformed(format!(
				"grid dimensions {} x {} x {} contain a zero",
				len_i, len_j, len_k
			)));
		}
		let total_voxels = len_i
			.checked_mul(len_j)
			.and_then(|n| n.checked_mul(len_k))
			.ok_or_else(|| SiteError::malformed("grid dimensions overflow"))?;
		let bounds = BoundingBox {
			min: min_coord,
			max: max_coord,
		};
		match lattice_dims(&bounds.extent(), grid_size) {
			Some(dims) if dims == [len_i, len_j, len_k] => {}
			Some(dims) => {
				return Err(SiteError::malformed(format!(
					"grid dimensions {} x {} x {} do not fit its bounds (expected {} x {} x {})",
					len_i, len_j, len_k, dims[0], dims[1], dims[2]
				)));
			}
			None => return Err(SiteError::malformed("grid bounds exceed the voxel limit")),
		}

		let data = stream::read_f32_buffer(r, total_voxels, "grid voxels")?;

		Ok(Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			grid_size,
			min_coord,
			max_coord,
			data,
		})
	}
}

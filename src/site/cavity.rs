use std::fmt;
use std::io::{Read, Write};

use crate::coord::{BoundingBox, Coord};
use crate::error::{Result, SiteError};
use crate::stream;

/// Coordinates reserved up front when reading; larger cavities grow as they stream in.
const READ_CAPACITY_HINT: usize = 1 << 16;

/// A detected pocket: the coordinates sampling it and its volume in A^3.
///
/// Immutable once built; the site mapper produces these and the docking site
/// only reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct Cavity {
	coords: Vec<Coord>,
	volume: f64,
}

impl Cavity {
	/// Cavity with an externally computed volume
	pub fn new(coords: Vec<Coord>, volume: f64) -> Self {
		Self { coords, volume }
	}

	/// Cavity whose coordinates are voxel centers of spacing `voxel_step`;
	/// the volume is the number of voxels times the voxel volume.
	pub fn from_voxels(coords: Vec<Coord>, voxel_step: f64) -> Self {
		let volume = coords.len() as f64 * voxel_step.powi(3);
		Self { coords, volume }
	}

	pub fn coords(&self) -> &[Coord] {
		&self.coords
	}

	pub fn num_coords(&self) -> usize {
		self.coords.len()
	}

	pub fn volume(&self) -> f64 {
		self.volume
	}

	/// Bounding box of this cavity's coordinates, `None` if it has none
	pub fn bounds(&self) -> Option<BoundingBox> {
		BoundingBox::from_coords(&self.coords)
	}

	/// Mean of the coordinates
	pub fn centroid(&self) -> Option<Coord> {
		if self.coords.is_empty() {
			return None;
		}
		let n = self.coords.len() as f64;
		let sum = self.coords.iter().fold(Coord::default(), |acc, c| {
			Coord::new(acc.x + c.x, acc.y + c.y, acc.z + c.z)
		});
		Some(Coord::new(sum.x / n, sum.y / n, sum.z / n))
	}

	pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
		stream::write_len(w, self.coords.len(), "cavity coordinate")?;
		for c in &self.coords {
			stream::write_coord(w, c)?;
		}
		stream::write_f64(w, self.volume)
	}

	pub fn read<R: Read>(r: &mut R) -> Result<Self> {
		let n = stream::read_u32(r, "cavity coordinate count")? as usize;
		let mut coords = Vec::with_capacity(n.min(READ_CAPACITY_HINT));
		for _ in 0..n {
			let c = stream::read_coord(r, "cavity coordinates")?;
			if !c.is_finite() {
				return Err(SiteError::malformed(format!("cavity coordinate {} is not finite", c)));
			}
			coords.push(c);
		}
		let volume = stream::read_f64(r, "cavity volume")?;
		Ok(Self { coords, volume })
	}
}

impl fmt::Display for Cavity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} points, volume {:.3} A^3", self.coords.len(), self.volume)?;
		if let (Some(center), Some(bounds)) = (self.centroid(), self.bounds()) {
			write!(f, ", center {}, min {}, max {}", center, bounds.min, bounds.max)?;
		}
		Ok(())
	}
}

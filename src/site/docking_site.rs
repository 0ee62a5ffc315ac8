//! The docking site: a set of cavities, their bounding box, a border margin
//! and a lazily built grid of distances to the nearest cavity coordinate.
//!
//! The grid lets callers pick atoms by proximity to the cavities without
//! scanning every cavity coordinate per atom.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::coord::{BoundingBox, Coord};
use crate::error::{Result, SiteError};
use crate::site::atom::Located;
use crate::site::builder::{cavity_bounds, collect_coords, DistanceFieldBuilder};
use crate::site::cavity::Cavity;
use crate::stream;
use crate::voxel_grid::geometry::{GridConfig, GridParams};
use crate::voxel_grid::grid::RealGrid;

const SITE_TAG: &str = "DockingSite";
const FORMAT_VERSION: u32 = 1;

/// Shared handle; sites are never duplicated.
pub type DockingSitePtr = Arc<DockingSite>;

/// Whether the distance grid has been computed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
	Unbuilt,
	Built,
}

#[derive(Debug)]
pub struct DockingSite {
	cavities: Vec<Cavity>,
	bounds: BoundingBox,
	border: f64,
	config: GridConfig,
	grid: OnceLock<RealGrid>,
}

/// Predicate selecting positions whose grid distance lies in `[min_dist, max_dist]`.
///
/// Positions outside the grid are never in range.
pub fn in_range(grid: &RealGrid, min_dist: f64, max_dist: f64) -> impl Fn(&Coord) -> bool + '_ {
	move |c: &Coord| match grid.get_value(c) {
		Some(d) => {
			let d = d as f64;
			d >= min_dist && d <= max_dist
		}
		None => false,
	}
}

fn check_range(min_dist: f64, max_dist: f64) -> Result<()> {
	// written so NaN bounds fail as well
	if min_dist <= max_dist {
		Ok(())
	} else {
		Err(SiteError::InvalidRange {
			min: min_dist,
			max: max_dist,
		})
	}
}

fn check_border(border: f64) -> Result<()> {
	if border.is_finite() && border >= 0.0 {
		Ok(())
	} else {
		Err(SiteError::InvalidGrid(format!(
			"border must be non-negative and finite, got {}",
			border
		)))
	}
}

impl DockingSite {
	/// Site over `cavities` with the default grid configuration.
	pub fn new(cavities: Vec<Cavity>, border: f64) -> Result<Self> {
		Self::with_config(cavities, border, GridConfig::default())
	}

	/// Site over `cavities`; the bounding box is computed now, the grid on first use.
	pub fn with_config(cavities: Vec<Cavity>, border: f64, config: GridConfig) -> Result<Self> {
		let bounds = cavity_bounds(&cavities)?;
		check_border(border)?;
		config.validate()?;
		// settle the lattice now so the lazy build cannot fail
		GridParams::from_bounds(&bounds, border, config.step)?;
		log::debug!(
			"Docking site over {} cavities, bounds {} - {}, border {:.2} A",
			cavities.len(),
			bounds.min,
			bounds.max,
			border
		);
		Ok(Self {
			cavities,
			bounds,
			border,
			config,
			grid: OnceLock::new(),
		})
	}

	pub fn into_shared(self) -> DockingSitePtr {
		Arc::new(self)
	}

	/// The distance grid, built on first call and cached afterwards.
	pub fn grid(&self) -> &RealGrid {
		self.grid.get_or_init(|| self.create_grid())
	}

	/// Build the grid now if it has not been built yet.
	pub fn build_grid(&self) -> &RealGrid {
		self.grid()
	}

	pub fn grid_state(&self) -> GridState {
		if self.grid.get().is_some() {
			GridState::Built
		} else {
			GridState::Unbuilt
		}
	}

	fn create_grid(&self) -> RealGrid {
		let builder = DistanceFieldBuilder::new(self.border, self.config.clone());
		match builder.build(&self.cavities) {
			Ok(grid) => grid,
			// construction and read both checked the cavities and lattice size
			Err(e) => unreachable!("distance grid inputs were validated: {}", e),
		}
	}

	pub fn border(&self) -> f64 {
		self.border
	}

	pub fn min_coord(&self) -> Coord {
		self.bounds.min
	}

	pub fn max_coord(&self) -> Coord {
		self.bounds.max
	}

	pub fn bounds(&self) -> BoundingBox {
		self.bounds
	}

	pub fn grid_config(&self) -> &GridConfig {
		&self.config
	}

	pub fn cavities(&self) -> &[Cavity] {
		&self.cavities
	}

	pub fn num_cavities(&self) -> usize {
		self.cavities.len()
	}

	/// Total volume of all cavities in A^3
	pub fn volume(&self) -> f64 {
		self.cavities.iter().map(Cavity::volume).sum()
	}

	/// Combined coordinate lists of all the cavities
	pub fn coord_list(&self) -> Vec<Coord> {
		collect_coords(&self.cavities)
	}

	/// Atoms whose grid distance from the cavities lies in `[min_dist, max_dist]`.
	///
	/// Builds the grid if needed.
	pub fn atom_list<'a, A: Located>(
		&self,
		atoms: &'a [A],
		min_dist: f64,
		max_dist: f64,
	) -> Result<Vec<&'a A>> {
		check_range(min_dist, max_dist)?;
		let keep = in_range(self.grid(), min_dist, max_dist);
		Ok(atoms.iter().filter(|a| keep(&a.position())).collect())
	}

	/// Atoms within `max_dist` of any cavity coordinate, measured exactly.
	///
	/// Does not need the grid; cost grows with atoms times cavity coordinates.
	pub fn atoms_within<'a, A: Located>(&self, atoms: &'a [A], max_dist: f64) -> Vec<&'a A> {
		let max_dist2 = max_dist * max_dist;
		atoms
			.iter()
			.filter(|a| {
				let p = a.position();
				max_dist >= 0.0
					&& self
						.cavities
						.iter()
						.flat_map(Cavity::coords)
						.any(|c| p.dist2(c) <= max_dist2)
			})
			.collect()
	}

	/// Number of atoms `atom_list` would return for the same bounds.
	pub fn num_atoms<A: Located>(&self, atoms: &[A], min_dist: f64, max_dist: f64) -> Result<usize> {
		check_range(min_dist, max_dist)?;
		let keep = in_range(self.grid(), min_dist, max_dist);
		Ok(atoms.iter().filter(|a| keep(&a.position())).count())
	}

	/// Write the site: cavities, border, bounding box, step, then the grid if built.
	pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
		stream::write_tag(w, SITE_TAG)?;
		stream::write_u32(w, FORMAT_VERSION)?;

		stream::write_len(w, self.cavities.len(), "cavity")?;
		for cavity in &self.cavities {
			cavity.write(w)?;
		}
		stream::write_f64(w, self.border)?;
		stream::write_coord(w, &self.bounds.min)?;
		stream::write_coord(w, &self.bounds.max)?;
		stream::write_f64(w, self.config.step)?;

		match self.grid.get() {
			Some(grid) => {
				stream::write_u8(w, 1)?;
				grid.write(w)?;
			}
			None => stream::write_u8(w, 0)?,
		}
		Ok(())
	}

	/// Read a site written by [`DockingSite::write`], trusting the stored
	/// bounding box and grid as they are.
	pub fn read<R: Read>(r: &mut R) -> Result<Self> {
		stream::expect_tag(r, SITE_TAG)?;
		let version = stream::read_u32(r, "format version")?;
		if version != FORMAT_VERSION {
			return Err(SiteError::malformed(format!(
				"unsupported format version {} (expected {})",
				version, FORMAT_VERSION
			)));
		}

		let n_cavities = stream::read_u32(r, "cavity count")? as usize;
		if n_cavities == 0 {
			return Err(SiteError::malformed("site has no cavities"));
		}
		let mut cavities = Vec::with_capacity(n_cavities.min(1024));
		for _ in 0..n_cavities {
			cavities.push(Cavity::read(r)?);
		}
		if cavities.iter().all(|c| c.num_coords() == 0) {
			return Err(SiteError::malformed("cavities have no coordinates"));
		}

		let border = stream::read_f64(r, "border")?;
		check_border(border).map_err(|_| SiteError::malformed(format!("bad border {}", border)))?;

		let min = stream::read_coord(r, "min coord")?;
		let max = stream::read_coord(r, "max coord")?;
		let bounds = BoundingBox::new(min, max)
			.ok_or_else(|| SiteError::malformed(format!("min coord {} exceeds max coord {}", min, max)))?;

		let step = stream::read_f64(r, "grid step")?;
		let mut config = GridConfig::with_step(step);
		let cavity_box = cavity_bounds(&cavities).map_err(|e| SiteError::malformed(e.to_string()))?;
		GridParams::from_bounds(&cavity_box, border, step)
			.map_err(|e| SiteError::malformed(format!("stored grid settings are unusable: {}", e)))?;

		let grid = OnceLock::new();
		match stream::read_u8(r, "grid flag")? {
			0 => {}
			1 => {
				let g = RealGrid::read(r)?;
				// the stored voxels win over the stored step
				config.step = g.grid_size;
				let _ = grid.set(g);
			}
			flag => return Err(SiteError::malformed(format!("grid flag {} is not 0 or 1", flag))),
		}

		log::debug!(
			"Read docking site: {} cavities, grid {}",
			cavities.len(),
			if grid.get().is_some() { "present" } else { "absent" }
		);
		Ok(Self {
			cavities,
			bounds,
			border,
			config,
			grid,
		})
	}

	pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let mut w = BufWriter::new(File::create(path.as_ref())?);
		self.write(&mut w)?;
		w.flush()?;
		log::info!("Docking site saved: {}", path.as_ref().display());
		Ok(())
	}

	pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let mut r = BufReader::new(File::open(path.as_ref())?);
		Self::read(&mut r)
	}
}

impl fmt::Display for DockingSite {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Docking site")?;
		writeln!(f, "  Cavities: {}", self.num_cavities())?;
		writeln!(f, "  Total volume: {:.3} A^3", self.volume())?;
		writeln!(f, "  Border: {:.3} A", self.border)?;
		writeln!(f, "  Min coord: {}", self.bounds.min)?;
		writeln!(f, "  Max coord: {}", self.bounds.max)?;
		match self.grid.get() {
			Some(grid) => writeln!(
				f,
				"  Grid: {} x {} x {} at {:.3} A",
				grid.len_i, grid.len_j, grid.len_k, grid.grid_size
			)?,
			None => writeln!(f, "  Grid: not built")?,
		}
		for (n, cavity) in self.cavities.iter().enumerate() {
			writeln!(f, "  Cavity {}: {}", n + 1, cavity)?;
		}
		Ok(())
	}
}

pub mod coord;
pub mod error;
pub mod stream;

pub mod voxel_grid {
	pub mod grid;
	pub mod utils;
	pub mod geometry;
	pub mod spatial;
	pub mod distance;
	pub mod binary;
	pub mod mrc_output;
	pub mod info;
}

pub mod site {
	pub mod atom;
	pub mod cavity;
	pub mod builder;
	pub mod docking_site;
	pub mod pdb;
}

pub use coord::{BoundingBox, Coord};
pub use error::{Result, SiteError};
pub use site::atom::{Atom, Located};
pub use site::builder::DistanceFieldBuilder;
pub use site::cavity::Cavity;
pub use site::docking_site::{in_range, DockingSite, DockingSitePtr, GridState};
pub use voxel_grid::geometry::{GridConfig, DEFAULT_GRID_STEP};
pub use voxel_grid::grid::RealGrid;

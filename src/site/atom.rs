use crate::coord::Coord;

/// Anything with a position that proximity queries can classify.
pub trait Located {
	fn position(&self) -> Coord;
}

impl Located for Coord {
	fn position(&self) -> Coord {
		*self
	}
}

impl<T: Located + ?Sized> Located for &T {
	fn position(&self) -> Coord {
		(**self).position()
	}
}

/// Atom record as read from a coordinate file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atom {
	pub serial: usize,
	pub name: String,
	pub residue: String,
	pub chain: String,
	pub resnum: String,
	pub element: String,
	pub hetatm: bool,
	pub coords: Coord,
}

impl Atom {
	/// Bare atom at a position, mostly for tests and synthetic inputs
	pub fn at(serial: usize, coords: Coord) -> Self {
		Self {
			serial,
			name: "X".to_string(),
			element: "X".to_string(),
			coords,
			..Self::default()
		}
	}

	pub fn is_hydrogen(&self) -> bool {
		self.element.eq_ignore_ascii_case("H") || self.element.eq_ignore_ascii_case("D")
	}
}

impl Located for Atom {
	fn position(&self) -> Coord {
		self.coords
	}
}

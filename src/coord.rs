use std::fmt;

/// Cartesian coordinate in angstroms
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Coord {
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	/// Squared Euclidean distance to `other`
	#[inline]
	pub fn dist2(&self, other: &Coord) -> f64 {
		let dx = self.x - other.x;
		let dy = self.y - other.y;
		let dz = self.z - other.z;
		dx * dx + dy * dy + dz * dz
	}

	/// Euclidean distance to `other`
	#[inline]
	pub fn dist(&self, other: &Coord) -> f64 {
		self.dist2(other).sqrt()
	}

	/// Component-wise minimum
	#[inline]
	pub fn min(&self, other: &Coord) -> Coord {
		Coord::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
	}

	/// Component-wise maximum
	#[inline]
	pub fn max(&self, other: &Coord) -> Coord {
		Coord::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
	}

	/// Shift every component by the same amount
	#[inline]
	pub fn offset(&self, delta: f64) -> Coord {
		Coord::new(self.x + delta, self.y + delta, self.z + delta)
	}

	pub fn is_finite(&self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
	}
}

impl From<[f64; 3]> for Coord {
	fn from(v: [f64; 3]) -> Self {
		Coord::new(v[0], v[1], v[2])
	}
}

impl fmt::Display for Coord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
	}
}

/// Axis-aligned box with `min <= max` on every axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
	pub min: Coord,
	pub max: Coord,
}

impl BoundingBox {
	pub fn new(min: Coord, max: Coord) -> Option<Self> {
		if min.x <= max.x && min.y <= max.y && min.z <= max.z {
			Some(Self { min, max })
		} else {
			None
		}
	}

	/// Tightest box around the coordinates; `None` when there are none
	pub fn from_coords<'a, I>(coords: I) -> Option<Self>
	where
		I: IntoIterator<Item = &'a Coord>,
	{
		let mut iter = coords.into_iter();
		let first = *iter.next()?;
		let (min, max) = iter.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
		Some(Self { min, max })
	}

	/// Grow the box by `border` on all six faces
	pub fn expanded(&self, border: f64) -> Self {
		Self {
			min: self.min.offset(-border),
			max: self.max.offset(border),
		}
	}

	/// Inclusive containment test
	pub fn contains(&self, c: &Coord) -> bool {
		c.x >= self.min.x
			&& c.x <= self.max.x
			&& c.y >= self.min.y
			&& c.y <= self.max.y
			&& c.z >= self.min.z
			&& c.z <= self.max.z
	}

	pub fn extent(&self) -> Coord {
		Coord::new(
			self.max.x - self.min.x,
			self.max.y - self.min.y,
			self.max.z - self.min.z,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bounding_box_covers_all_points() {
		let pts = vec![
			Coord::new(1.0, -2.0, 3.0),
			Coord::new(-4.0, 5.0, 0.5),
			Coord::new(0.0, 0.0, 9.0),
		];
		let bbox = BoundingBox::from_coords(&pts).unwrap();
		assert_eq!(bbox.min, Coord::new(-4.0, -2.0, 0.5));
		assert_eq!(bbox.max, Coord::new(1.0, 5.0, 9.0));
		assert!(pts.iter().all(|p| bbox.contains(p)));
	}

	#[test]
	fn empty_input_has_no_box() {
		let pts: Vec<Coord> = Vec::new();
		assert!(BoundingBox::from_coords(&pts).is_none());
	}

	#[test]
	fn expansion_moves_every_face() {
		let bbox = BoundingBox::new(Coord::new(0.0, 0.0, 0.0), Coord::new(1.0, 0.0, 0.0)).unwrap();
		let grown = bbox.expanded(2.0);
		assert_eq!(grown.min, Coord::new(-2.0, -2.0, -2.0));
		assert_eq!(grown.max, Coord::new(3.0, 2.0, 2.0));
		assert!(!bbox.contains(&Coord::new(0.0, 0.1, 0.0)));
		assert!(grown.contains(&Coord::new(0.0, 0.1, 0.0)));
	}

	#[test]
	fn inverted_box_is_rejected() {
		assert!(BoundingBox::new(Coord::new(1.0, 0.0, 0.0), Coord::new(0.0, 1.0, 1.0)).is_none());
	}
}

//! Little-endian primitives shared by the grid, cavity and site binary formats.

use std::io::{Read, Write};

use crate::coord::Coord;
use crate::error::{Result, SiteError};

/// Upper bound on length-prefixed tag strings.
const MAX_TAG_LEN: u32 = 256;

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
	w.write_all(&[v])?;
	Ok(())
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
	w.write_all(&v.to_le_bytes())?;
	Ok(())
}

pub fn write_f64<W: Write>(w: &mut W, v: f64) -> Result<()> {
	w.write_all(&v.to_le_bytes())?;
	Ok(())
}

pub fn write_coord<W: Write>(w: &mut W, c: &Coord) -> Result<()> {
	write_f64(w, c.x)?;
	write_f64(w, c.y)?;
	write_f64(w, c.z)
}

/// Write a count that must fit the on-disk `u32`.
pub fn write_len<W: Write>(w: &mut W, len: usize, what: &str) -> Result<()> {
	let v = u32::try_from(len).map_err(|_| {
		std::io::Error::new(
			std::io::ErrorKind::InvalidInput,
			format!("{} count {} exceeds u32", what, len),
		)
	})?;
	write_u32(w, v)
}

pub fn write_tag<W: Write>(w: &mut W, tag: &str) -> Result<()> {
	write_len(w, tag.len(), "tag")?;
	w.write_all(tag.as_bytes())?;
	Ok(())
}

fn read_array<R: Read, const N: usize>(r: &mut R, what: &str) -> Result<[u8; N]> {
	let mut buf = [0u8; N];
	r.read_exact(&mut buf).map_err(|e| SiteError::from_read(e, what))?;
	Ok(buf)
}

pub fn read_u8<R: Read>(r: &mut R, what: &str) -> Result<u8> {
	Ok(read_array::<R, 1>(r, what)?[0])
}

pub fn read_u32<R: Read>(r: &mut R, what: &str) -> Result<u32> {
	Ok(u32::from_le_bytes(read_array(r, what)?))
}

pub fn read_f64<R: Read>(r: &mut R, what: &str) -> Result<f64> {
	Ok(f64::from_le_bytes(read_array(r, what)?))
}

pub fn read_coord<R: Read>(r: &mut R, what: &str) -> Result<Coord> {
	let x = read_f64(r, what)?;
	let y = read_f64(r, what)?;
	let z = read_f64(r, what)?;
	Ok(Coord::new(x, y, z))
}

/// Read a length-prefixed tag and check it against `expected`.
pub fn expect_tag<R: Read>(r: &mut R, expected: &str) -> Result<()> {
	let len = read_u32(r, "tag length")?;
	if len > MAX_TAG_LEN {
		return Err(SiteError::malformed(format!("tag length {} is implausible", len)));
	}
	let mut buf = vec![0u8; len as usize];
	r.read_exact(&mut buf).map_err(|e| SiteError::from_read(e, "tag"))?;
	if buf != expected.as_bytes() {
		return Err(SiteError::malformed(format!(
			"expected '{}' section, found '{}'",
			expected,
			String::from_utf8_lossy(&buf)
		)));
	}
	Ok(())
}

/// Read exactly `count` little-endian `f32` values.
///
/// Reads through `take` so a corrupt count cannot force a huge allocation
/// before the stream runs dry.
pub fn read_f32_buffer<R: Read>(r: &mut R, count: usize, what: &str) -> Result<Vec<f32>> {
	let byte_len = count
		.checked_mul(4)
		.ok_or_else(|| SiteError::malformed(format!("{} count {} overflows", what, count)))?;
	let mut bytes = Vec::new();
	r.take(byte_len as u64)
		.read_to_end(&mut bytes)
		.map_err(|e| SiteError::from_read(e, what))?;
	if bytes.len() != byte_len {
		return Err(SiteError::malformed(format!(
			"truncated while reading {}: expected {} bytes, got {}",
			what,
			byte_len,
			bytes.len()
		)));
	}
	Ok(bytes
		.chunks_exact(4)
		.map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
		.collect())
}

pub fn write_f32_buffer<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
	let mut bytes = Vec::with_capacity(values.len() * 4);
	for v in values {
		bytes.extend_from_slice(&v.to_le_bytes());
	}
	w.write_all(&bytes)?;
	Ok(())
}

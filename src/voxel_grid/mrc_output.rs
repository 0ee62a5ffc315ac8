use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;
use std::time::Instant;

use crate::voxel_grid::grid::RealGrid;

/// MRC data mode for 32-bit reals
const MODE_FLOAT: i32 = 2;
/// Machine stamp for little-endian data
const MACHINE_STAMP_LE: [u8; 4] = [0x44, 0x44, 0x00, 0x00];

/// MRC 2014 header for a float map
#[derive(Debug)]
pub struct MrcHeader {
	dims: [i32; 3],  // Grid dimensions (columns, rows, sections)
	cell: [f32; 3],  // Physical size in angstroms
	origin: [f32; 3],  // Position of voxel (0,0,0)
	amin: f32, amax: f32, amean: f32,  // Data range
	rms: f32,
	label: String,
}

impl MrcHeader {
	/// Header describing `grid`, with statistics taken from its voxels
	pub fn for_grid(grid: &RealGrid, label: &str) -> Self {
		let (amin, amax) = grid.value_range().unwrap_or((0.0, 0.0));
		let mean = grid.mean_value();
		let variance = if grid.data.is_empty() {
			0.0
		} else {
			grid.data
				.iter()
				.map(|&v| (v as f64 - mean).powi(2))
				.sum::<f64>() / grid.data.len() as f64
		};
		Self {
			dims: [grid.len_i as i32, grid.len_j as i32, grid.len_k as i32],
			cell: [
				(grid.len_i as f64 * grid.grid_size) as f32,
				(grid.len_j as f64 * grid.grid_size) as f32,
				(grid.len_k as f64 * grid.grid_size) as f32,
			],
			origin: [
				grid.min_coord.x as f32,
				grid.min_coord.y as f32,
				grid.min_coord.z as f32,
			],
			amin,
			amax,
			amean: mean as f32,
			rms: variance.sqrt() as f32,
			label: label.to_string(),
		}
	}

	/// Serialize the 1024-byte header
	pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
		let mut words: Vec<u8> = Vec::with_capacity(1024);
		let put_i32 = |buf: &mut Vec<u8>, v: i32| buf.extend_from_slice(&v.to_le_bytes());
		let put_f32 = |buf: &mut Vec<u8>, v: f32| buf.extend_from_slice(&v.to_le_bytes());

		for d in self.dims {
			put_i32(&mut words, d);
		}
		put_i32(&mut words, MODE_FLOAT);
		for _ in 0..3 {
			put_i32(&mut words, 0); // start positions
		}
		for d in self.dims {
			put_i32(&mut words, d); // sampling
		}
		for c in self.cell {
			put_f32(&mut words, c);
		}
		for _ in 0..3 {
			put_f32(&mut words, 90.0);
		}
		for axis in [1, 2, 3] {
			put_i32(&mut words, axis);
		}
		put_f32(&mut words, self.amin);
		put_f32(&mut words, self.amax);
		put_f32(&mut words, self.amean);
		put_i32(&mut words, 1); // space group
		put_i32(&mut words, 0); // symmetry bytes
		for _ in 0..25 {
			put_i32(&mut words, 0);
		}
		for o in self.origin {
			put_f32(&mut words, o);
		}
		words.extend_from_slice(b"MAP ");
		words.extend_from_slice(&MACHINE_STAMP_LE);
		put_f32(&mut words, self.rms);
		put_i32(&mut words, if self.label.is_empty() { 0 } else { 1 });

		let mut label = [b' '; 800];
		let bytes = self.label.as_bytes();
		let n = bytes.len().min(80);
		label[..n].copy_from_slice(&bytes[..n]);
		words.extend_from_slice(&label);

		debug_assert_eq!(words.len(), 1024);
		w.write_all(&words)
	}
}

impl RealGrid {
	/// Write the grid as a float MRC map
	pub fn write_mrc<W: Write>(&self, w: &mut W, label: &str) -> Result<()> {
		MrcHeader::for_grid(self, label).write_to(w)?;
		let mut bytes = Vec::with_capacity(self.data.len() * 4);
		for v in &self.data {
			bytes.extend_from_slice(&v.to_le_bytes());
		}
		w.write_all(&bytes)
	}

	/// Save the grid as an MRC file and report save time
	pub fn write_to_mrc_file<P: AsRef<Path>>(&self, path: P, label: &str) -> Result<()> {
		let start_time = Instant::now();
		let mut file = BufWriter::new(File::create(path.as_ref())?);
		self.write_mrc(&mut file, label)?;
		file.flush()?;
		log::info!(
			"MRC file saved: {} ({:.3} s)",
			path.as_ref().display(),
			start_time.elapsed().as_secs_f64()
		);
		Ok(())
	}
}

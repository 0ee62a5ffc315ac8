use std::borrow::Borrow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use regex::Regex;

use crate::coord::Coord;
use crate::site::atom::Atom;
use crate::site::cavity::Cavity;

/// Record filters applied while loading atoms.
#[derive(Debug, Clone, Default)]
pub struct Filters {
	pub exclude_water: bool,
	pub exclude_hydrogens: bool,
	pub exclude_hetatm: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PdbOptions {
	pub filters: Filters,
	/// Keep only atoms whose trimmed name matches
	pub atom_name: Option<Regex>,
}

impl PdbOptions {
	/// Options selecting atom names by `pattern`
	pub fn with_atom_name(pattern: &str) -> Result<Self, regex::Error> {
		Ok(Self {
			atom_name: Some(Regex::new(pattern)?),
			..Self::default()
		})
	}
}

const WATER_RESIDUES: &[&str] = &[
	"HOH", "H2O", "DOD", "WAT", "SOL", "TIP", "TIP3", "TIP3P", "TIP4", "TIP4P", "TIP5P", "SPC",
	"OH2",
];

/// Residue name used for cavity pseudo-atoms.
const CAVITY_RESIDUE: &str = "CAV";

fn is_water(name: &str) -> bool {
	let upper = name.to_ascii_uppercase();
	WATER_RESIDUES.contains(&upper.as_str()) || upper.starts_with("HOH") || upper.starts_with("TIP")
}

fn get_field(line: &str, start: usize, len: usize) -> &str {
	if line.len() <= start {
		return "";
	}
	let end = (start + len).min(line.len());
	line.get(start..end).unwrap_or("")
}

/// Element from columns 77-78, else the first letter of the atom name
fn element_for(line: &str, atom_name: &str) -> String {
	let element = get_field(line, 76, 2).trim();
	if !element.is_empty() {
		return element.to_ascii_uppercase();
	}
	atom_name
		.chars()
		.find(|c| c.is_ascii_alphabetic())
		.map(|c| c.to_ascii_uppercase().to_string())
		.unwrap_or_default()
}

fn parse_coord(line: &str, line_no: usize) -> io::Result<Coord> {
	let mut xyz = [0.0f64; 3];
	for (axis, start) in [30usize, 38, 46].into_iter().enumerate() {
		let raw = get_field(line, start, 8).trim();
		xyz[axis] = raw.parse::<f64>().map_err(|_| {
			io::Error::new(
				io::ErrorKind::InvalidData,
				format!("line {}: bad coordinate '{}'", line_no, raw),
			)
		})?;
	}
	Ok(Coord::from(xyz))
}

/// Parse every ATOM/HETATM record, in file order
fn parse_atom_records<R: BufRead>(reader: R) -> io::Result<Vec<Atom>> {
	let mut atoms: Vec<Atom> = Vec::new();
	for (n, line_res) in reader.lines().enumerate() {
		let line = line_res?;
		if line.len() < 6 {
			continue;
		}
		let record = get_field(&line, 0, 6).trim().to_ascii_uppercase();
		if record != "ATOM" && record != "HETATM" {
			continue;
		}
		let coords = parse_coord(&line, n + 1)?;
		let name = get_field(&line, 12, 4).trim().to_string();
		atoms.push(Atom {
			serial: get_field(&line, 6, 5).trim().parse().unwrap_or(atoms.len() + 1),
			element: element_for(&line, &name),
			name,
			residue: get_field(&line, 17, 3).trim().to_string(),
			chain: get_field(&line, 21, 1).trim().to_string(),
			resnum: get_field(&line, 22, 4).trim().to_string(),
			hetatm: record == "HETATM",
			coords,
		});
	}
	Ok(atoms)
}

fn should_keep(atom: &Atom, opts: &PdbOptions) -> bool {
	let filters = &opts.filters;
	if filters.exclude_water && is_water(&atom.residue) {
		return false;
	}
	if filters.exclude_hydrogens && atom.is_hydrogen() {
		return false;
	}
	if filters.exclude_hetatm && atom.hetatm {
		return false;
	}
	match &opts.atom_name {
		Some(re) => re.is_match(&atom.name),
		None => true,
	}
}

/// Parse a PDB file into atoms, applying the record filters
pub fn load_atoms_from_path<P: AsRef<Path>>(path: P, opts: &PdbOptions) -> io::Result<Vec<Atom>> {
	let file = File::open(path)?;
	load_atoms_from_reader(BufReader::new(file), opts)
}

pub fn load_atoms_from_reader<R: BufRead>(reader: R, opts: &PdbOptions) -> io::Result<Vec<Atom>> {
	let atoms = parse_atom_records(reader)?;
	let total = atoms.len();
	let kept: Vec<Atom> = atoms.into_iter().filter(|a| should_keep(a, opts)).collect();
	log::debug!("Loaded {} of {} atom records", kept.len(), total);
	Ok(kept)
}

/// Parse `REMARK   CAVITY <n> VOLUME <v>`
fn parse_volume_remark(line: &str) -> Option<(usize, f64)> {
	let mut tokens = line.split_whitespace();
	if tokens.next()? != "REMARK" || tokens.next()? != "CAVITY" {
		return None;
	}
	let n = tokens.next()?.parse().ok()?;
	if tokens.next()? != "VOLUME" {
		return None;
	}
	Some((n, tokens.next()?.parse().ok()?))
}

/// Read cavities stored as pseudo-atoms: each (chain, residue number) group
/// is one cavity, in order of first appearance. Volumes come from
/// `REMARK CAVITY` lines when present, otherwise from the point count and
/// `voxel_step`.
pub fn load_cavities_from_reader<R: BufRead>(mut reader: R, voxel_step: f64) -> io::Result<Vec<Cavity>> {
	let mut text = String::new();
	reader.read_to_string(&mut text)?;

	let volumes: HashMap<usize, f64> = text.lines().filter_map(parse_volume_remark).collect();
	let mut groups: Vec<Vec<Coord>> = Vec::new();
	let mut slots: HashMap<(String, String), usize> = HashMap::new();

	for atom in parse_atom_records(text.as_bytes())? {
		let key = (atom.chain, atom.resnum);
		let slot = *slots.entry(key).or_insert_with(|| {
			groups.push(Vec::new());
			groups.len() - 1
		});
		groups[slot].push(atom.coords);
	}

	let cavities: Vec<Cavity> = groups
		.into_iter()
		.enumerate()
		.map(|(idx, coords)| match volumes.get(&(idx + 1)) {
			Some(&volume) => Cavity::new(coords, volume),
			None => Cavity::from_voxels(coords, voxel_step),
		})
		.collect();
	log::debug!("Loaded {} cavities", cavities.len());
	Ok(cavities)
}

pub fn load_cavities_from_path<P: AsRef<Path>>(path: P, voxel_step: f64) -> io::Result<Vec<Cavity>> {
	let file = File::open(path)?;
	load_cavities_from_reader(BufReader::new(file), voxel_step)
}

fn pdb_atom_name(name: &str) -> String {
	if name.chars().count() >= 4 {
		name.chars().take(4).collect()
	} else {
		format!(" {:<3}", name)
	}
}

fn write_record<W: Write>(w: &mut W, atom: &Atom) -> io::Result<()> {
	writeln!(
		w,
		"{:<6}{:>5} {:<4} {:>3} {:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
		if atom.hetatm { "HETATM" } else { "ATOM" },
		atom.serial % 100_000,
		pdb_atom_name(&atom.name),
		atom.residue,
		atom.chain,
		atom.resnum,
		atom.coords.x,
		atom.coords.y,
		atom.coords.z,
		1.0,
		0.0,
		atom.element
	)
}

/// Write atoms as PDB records. Returns number of atoms written.
pub fn write_atoms_pdb<W: Write, A: Borrow<Atom>>(atoms: &[A], mut w: W) -> io::Result<usize> {
	for atom in atoms {
		write_record(&mut w, atom.borrow())?;
	}
	writeln!(w, "END")?;
	Ok(atoms.len())
}

/// Write cavities as pseudo-atoms, one residue per cavity, with volume remarks.
pub fn write_cavities_pdb<W: Write>(cavities: &[Cavity], mut w: W) -> io::Result<()> {
	for (idx, cavity) in cavities.iter().enumerate() {
		writeln!(w, "REMARK   CAVITY {} VOLUME {:.6}", idx + 1, cavity.volume())?;
	}
	let mut serial = 1usize;
	for (idx, cavity) in cavities.iter().enumerate() {
		for c in cavity.coords() {
			let atom = Atom {
				serial,
				name: "C".to_string(),
				residue: CAVITY_RESIDUE.to_string(),
				chain: "A".to_string(),
				resnum: ((idx + 1) % 10_000).to_string(),
				element: "C".to_string(),
				hetatm: true,
				coords: *c,
			};
			write_record(&mut w, &atom)?;
			serial += 1;
		}
	}
	writeln!(w, "END")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = "\
HEADER    TEST
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  HA  ALA A   1      12.000   6.500  -5.000  1.00  0.00           H
HETATM    4  O   HOH A 101       1.000   2.000   3.000  1.00  0.00           O
HETATM    5 ZN    ZN A 201      -1.500   0.250   4.125  1.00  0.00          ZN
END
";

	#[test]
	fn parses_fixed_columns() {
		let atoms = load_atoms_from_reader(SAMPLE.as_bytes(), &PdbOptions::default()).unwrap();
		assert_eq!(atoms.len(), 5);
		assert_eq!(atoms[1].name, "CA");
		assert_eq!(atoms[1].residue, "ALA");
		assert_eq!(atoms[1].chain, "A");
		assert_eq!(atoms[1].resnum, "1");
		assert_eq!(atoms[1].coords, Coord::new(11.639, 6.071, -5.147));
		assert_eq!(atoms[4].element, "ZN");
		assert!(atoms[4].hetatm);
	}

	#[test]
	fn filters_drop_records() {
		let mut opts = PdbOptions::default();
		opts.filters.exclude_water = true;
		opts.filters.exclude_hydrogens = true;
		let atoms = load_atoms_from_reader(SAMPLE.as_bytes(), &opts).unwrap();
		let names: Vec<&str> = atoms.iter().map(|a| a.name.as_str()).collect();
		assert_eq!(names, vec!["N", "CA", "ZN"]);

		let mut opts = PdbOptions::default();
		opts.filters.exclude_hetatm = true;
		assert_eq!(load_atoms_from_reader(SAMPLE.as_bytes(), &opts).unwrap().len(), 3);
	}

	#[test]
	fn atom_name_selection() {
		let opts = PdbOptions::with_atom_name("^C").unwrap();
		let atoms = load_atoms_from_reader(SAMPLE.as_bytes(), &opts).unwrap();
		assert_eq!(atoms.len(), 1);
		assert_eq!(atoms[0].name, "CA");
		assert!(PdbOptions::with_atom_name("(").is_err());
	}

	#[test]
	fn bad_coordinate_is_reported() {
		let text = "ATOM      1  N   ALA A   1      xx.xxx   6.134  -6.504\n";
		let err = load_atoms_from_reader(text.as_bytes(), &PdbOptions::default()).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::InvalidData);
	}

	#[test]
	fn written_atoms_parse_back() {
		let atoms = load_atoms_from_reader(SAMPLE.as_bytes(), &PdbOptions::default()).unwrap();
		let mut buf = Vec::new();
		assert_eq!(write_atoms_pdb(&atoms, &mut buf).unwrap(), 5);
		let back = load_atoms_from_reader(buf.as_slice(), &PdbOptions::default()).unwrap();
		assert_eq!(back, atoms);
	}

	#[test]
	fn cavities_group_by_residue() {
		let cavities = vec![
			Cavity::new(vec![Coord::new(0.0, 0.0, 0.0), Coord::new(0.5, 0.0, 0.0)], 42.5),
			Cavity::new(vec![Coord::new(5.0, 5.0, 5.0)], 3.25),
		];
		let mut buf = Vec::new();
		write_cavities_pdb(&cavities, &mut buf).unwrap();
		let back = load_cavities_from_reader(buf.as_slice(), 0.5).unwrap();
		assert_eq!(back, cavities);
	}

	#[test]
	fn missing_remarks_derive_volume() {
		let text = "\
HETATM    1  C   CAV A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  C   CAV A   1       0.500   0.000   0.000  1.00  0.00           C
HETATM    3  C   CAV A   2       4.000   0.000   0.000  1.00  0.00           C
";
		let cavities = load_cavities_from_reader(text.as_bytes(), 1.0).unwrap();
		assert_eq!(cavities.len(), 2);
		assert_eq!(cavities[0].num_coords(), 2);
		assert_eq!(cavities[0].volume(), 2.0);
		assert_eq!(cavities[1].volume(), 1.0);
	}
}

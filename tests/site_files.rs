use std::fs;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use tempfile::tempdir;

use dock_site::site::pdb::{self, PdbOptions};
use dock_site::voxel_grid::spatial::min_distance;
use dock_site::{Atom, Cavity, Coord, DockingSite, GridConfig, GridState, SiteError};

const CAVITY_PDB: &str = "\
REMARK   CAVITY 1 VOLUME 64.000000
HETATM    1  C   CAV A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  C   CAV A   1       0.500   0.000   0.000  1.00  0.00           C
HETATM    3  C   CAV A   1       0.500   0.500   0.000  1.00  0.00           C
HETATM    4  C   CAV A   2       4.000   1.000   1.000  1.00  0.00           C
HETATM    5  C   CAV A   2       4.000   1.500   1.000  1.00  0.00           C
END
";

const RECEPTOR_PDB: &str = "\
ATOM      1  N   GLY A   1       0.000   0.000   1.000  1.00  0.00           N
ATOM      2  CA  GLY A   1       2.000   0.000   0.000  1.00  0.00           C
ATOM      3  C   GLY A   1       4.000   1.000   3.500  1.00  0.00           C
ATOM      4  O   GLY A   1       7.500   0.000   0.000  1.00  0.00           O
HETATM    5  O   HOH A 101       0.250   0.250   0.000  1.00  0.00           O
ATOM      6  CB  GLY A   2      40.000  40.000  40.000  1.00  0.00           C
END
";

fn receptor() -> Vec<Atom> {
	pdb::load_atoms_from_reader(RECEPTOR_PDB.as_bytes(), &PdbOptions::default()).unwrap()
}

fn site_from_pdb() -> DockingSite {
	let cavities = pdb::load_cavities_from_reader(CAVITY_PDB.as_bytes(), 0.5).unwrap();
	DockingSite::with_config(cavities, 3.0, GridConfig::with_step(0.25)).unwrap()
}

#[test]
fn cavities_from_pdb_make_a_site() {
	let site = site_from_pdb();
	assert_eq!(site.num_cavities(), 2);
	assert_abs_diff_eq!(site.cavities()[0].volume(), 64.0);
	assert_abs_diff_eq!(site.cavities()[1].volume(), 2.0 * 0.125);
	assert_abs_diff_eq!(site.volume(), 64.25);
	assert_eq!(site.min_coord(), Coord::new(0.0, 0.0, 0.0));
	assert_eq!(site.max_coord(), Coord::new(4.0, 1.5, 1.0));
	for c in site.coord_list() {
		assert!(site.bounds().contains(&c));
	}
}

#[test]
fn grid_extent_matches_border() {
	let site = site_from_pdb();
	let grid = site.grid();
	let expected = site.bounds().expanded(site.border());
	assert_eq!(grid.bounds(), expected);
	assert_abs_diff_eq!(grid.grid_size, 0.25);
}

#[test]
fn range_queries_on_receptor_atoms() {
	let site = site_from_pdb();
	let atoms = receptor();

	let shell: Vec<usize> = site.atom_list(&atoms, 0.0, 1.2).unwrap().iter().map(|a| a.serial).collect();
	assert_eq!(shell, vec![1, 5]);

	let ring: Vec<usize> = site.atom_list(&atoms, 1.2, 3.0).unwrap().iter().map(|a| a.serial).collect();
	assert_eq!(ring, vec![2, 3]);
	assert_eq!(site.num_atoms(&atoms, 1.2, 3.0).unwrap(), 2);

	// atoms 4 and 6 lie outside the grid
	assert_eq!(site.num_atoms(&atoms, 0.0, 1.0e6).unwrap(), 4);
	assert_eq!(site.atoms_within(&atoms, 1.0e6).len(), 6);
}

#[test]
fn grid_tracks_exact_distances() {
	let site = site_from_pdb();
	let coords = site.coord_list();
	let half_diagonal = 0.25 * 3f64.sqrt() / 2.0;
	for atom in receptor().iter().filter(|a| site.grid().is_valid(&a.coords)) {
		let exact = min_distance(&atom.coords, &coords).unwrap();
		let gridded = site.grid().get_value(&atom.coords).unwrap() as f64;
		assert_abs_diff_eq!(exact, gridded, epsilon = half_diagonal + 1e-6);
	}
}

#[test]
fn saved_site_reads_back_from_disk() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("site.bin");

	let site = site_from_pdb();
	site.build_grid();
	site.write_to_path(&path).unwrap();

	let back = DockingSite::read_from_path(&path).unwrap();
	assert_eq!(back.grid_state(), GridState::Built);
	assert_eq!(back.num_cavities(), site.num_cavities());
	assert_eq!(back.cavities(), site.cavities());
	assert_eq!(back.bounds(), site.bounds());
	assert_abs_diff_eq!(back.border(), site.border());
	assert_abs_diff_eq!(back.grid_config().step, 0.25);

	let atoms = receptor();
	for (lo, hi) in [(0.0, 1.0), (0.5, 2.5), (2.0, 10.0)] {
		let a: Vec<usize> = site.atom_list(&atoms, lo, hi).unwrap().iter().map(|a| a.serial).collect();
		let b: Vec<usize> = back.atom_list(&atoms, lo, hi).unwrap().iter().map(|a| a.serial).collect();
		assert_eq!(a, b);
	}
}

#[test]
fn lazy_site_builds_grid_after_reading() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("lazy.bin");
	site_from_pdb().write_to_path(&path).unwrap();

	let back = DockingSite::read_from_path(&path).unwrap();
	assert_eq!(back.grid_state(), GridState::Unbuilt);
	assert_eq!(back.num_atoms(&receptor(), 0.0, 1.2).unwrap(), 2);
	assert_eq!(back.grid_state(), GridState::Built);
}

#[test]
fn truncated_file_is_malformed() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("cut.bin");
	let site = site_from_pdb();
	site.build_grid();
	site.write_to_path(&path).unwrap();

	let bytes = fs::read(&path).unwrap();
	fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();
	match DockingSite::read_from_path(&path) {
		Err(SiteError::MalformedStream(_)) => {}
		other => panic!("expected a malformed stream, got {:?}", other.map(|_| ())),
	}
}

#[test]
fn missing_file_is_an_io_error() {
	let dir = tempdir().unwrap();
	let err = DockingSite::read_from_path(dir.path().join("absent.bin")).unwrap_err();
	assert!(matches!(err, SiteError::Io { .. }));
}

#[test]
fn exported_cavities_rebuild_the_same_site() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("cavities.pdb");
	let site = site_from_pdb();
	pdb::write_cavities_pdb(site.cavities(), fs::File::create(&path).unwrap()).unwrap();

	let cavities = pdb::load_cavities_from_path(&path, 0.5).unwrap();
	let rebuilt = DockingSite::new(cavities, site.border()).unwrap();
	assert_eq!(rebuilt.cavities(), site.cavities());
	assert_eq!(rebuilt.bounds(), site.bounds());
}

#[test]
fn mrc_export_writes_header_and_voxels() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("grid.mrc");
	let site = site_from_pdb();
	site.grid().write_to_mrc_file(&path, "test").unwrap();
	let len = fs::metadata(&path).unwrap().len() as usize;
	assert_eq!(len, 1024 + site.grid().total_voxels * 4);
}

#[test]
fn shared_site_serves_parallel_queries() {
	let site = Arc::new(site_from_pdb());
	let atoms = Arc::new(receptor());
	let counts: Vec<usize> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..4)
			.map(|n| {
				let site = Arc::clone(&site);
				let atoms = Arc::clone(&atoms);
				scope.spawn(move || site.num_atoms(atoms.as_slice(), 0.0, 1.0 + n as f64).unwrap())
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});
	assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn single_point_cavity_is_well_defined() {
	let site = DockingSite::new(vec![Cavity::new(vec![Coord::new(2.0, 2.0, 2.0)], 1.0)], 1.0).unwrap();
	let grid = site.grid();
	assert_eq!((grid.len_i, grid.len_j, grid.len_k), (5, 5, 5));
	assert_abs_diff_eq!(grid.get_value(&Coord::new(2.0, 2.0, 2.0)).unwrap(), 0.0);
	assert_abs_diff_eq!(grid.get_value(&Coord::new(3.0, 2.0, 2.0)).unwrap(), 1.0, epsilon = 1e-6);
}

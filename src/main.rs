use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use dock_site::site::pdb::{self, PdbOptions};
use dock_site::voxel_grid::info;
use dock_site::{Atom, DockingSite, GridConfig, GridState};

#[derive(Parser)]
#[command(
	name = "dock-site",
	about = "Build docking sites from cavities and select atoms by distance to them",
	version,
	propagate_version = true
)]
struct Cli {
	/// Hide progress bars and the banner
	#[arg(short, long, global = true)]
	quiet: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Build a docking site from a cavity PDB and save it
	Build(BuildArgs),

	/// Print a summary of a saved docking site
	Info {
		/// Saved docking site
		site: PathBuf,
	},

	/// Select atoms by distance from the site's cavities
	Filter(FilterArgs),

	/// Write the distance grid as an MRC map
	ExportMrc {
		/// Saved docking site
		site: PathBuf,

		/// Output MRC file
		#[arg(short, long, value_name = "FILE")]
		output: PathBuf,
	},

	/// Write the site's cavities as a pseudo-atom PDB
	ExportCavities {
		/// Saved docking site
		site: PathBuf,

		/// Output PDB file
		#[arg(short, long, value_name = "FILE")]
		output: PathBuf,
	},
}

#[derive(Args)]
struct BuildArgs {
	/// Cavity pseudo-atoms, one residue per cavity
	#[arg(short, long, value_name = "FILE")]
	cavities: PathBuf,

	/// Padding around the cavities in angstroms
	#[arg(short, long, default_value_t = 8.0)]
	border: f64,

	/// Distance grid spacing in angstroms
	#[arg(long, default_value_t = dock_site::DEFAULT_GRID_STEP)]
	step: f64,

	/// Cavity voxel spacing, used for volumes missing from the file
	#[arg(long, default_value_t = 0.5)]
	cavity_step: f64,

	/// Save without computing the distance grid
	#[arg(long)]
	lazy: bool,

	/// Output docking site file
	#[arg(short, long, value_name = "FILE")]
	output: PathBuf,
}

#[derive(Args)]
struct FilterArgs {
	/// Saved docking site
	site: PathBuf,

	/// Atoms to classify
	#[arg(short, long, value_name = "FILE")]
	atoms: PathBuf,

	/// Minimum distance from the cavities in angstroms
	#[arg(long, default_value_t = 0.0)]
	min: f64,

	/// Maximum distance from the cavities in angstroms
	#[arg(long)]
	max: f64,

	/// Measure exact distances to cavity coordinates instead of using the grid (ignores --min)
	#[arg(long)]
	direct: bool,

	/// Only print how many atoms are in range
	#[arg(long)]
	count: bool,

	#[arg(long)]
	exclude_water: bool,

	#[arg(long)]
	exclude_hydrogens: bool,

	#[arg(long)]
	exclude_hetatm: bool,

	/// Keep only atoms whose name matches this regex
	#[arg(long, value_name = "REGEX")]
	select: Option<String>,

	/// Write selected atoms here instead of stdout
	#[arg(short, long, value_name = "FILE")]
	output: Option<PathBuf>,
}

fn load_site(path: &Path) -> Result<DockingSite> {
	DockingSite::read_from_path(path)
		.with_context(|| format!("Failed to read docking site {}", path.display()))
}

fn build(args: BuildArgs, quiet: bool) -> Result<()> {
	let cavities = pdb::load_cavities_from_path(&args.cavities, args.cavity_step)
		.with_context(|| format!("Failed to read cavities from {}", args.cavities.display()))?;
	let config = GridConfig {
		step: args.step,
		show_progress: !quiet,
	};
	let site = DockingSite::with_config(cavities, args.border, config)
		.context("Failed to set up docking site")?;
	if !args.lazy {
		site.build_grid();
	}
	site.write_to_path(&args.output)
		.with_context(|| format!("Failed to write {}", args.output.display()))?;
	eprint!("{}", site);
	Ok(())
}

fn filter(args: FilterArgs) -> Result<()> {
	let site = load_site(&args.site)?;

	let mut opts = match &args.select {
		Some(pattern) => PdbOptions::with_atom_name(pattern)
			.with_context(|| format!("Invalid atom name pattern '{}'", pattern))?,
		None => PdbOptions::default(),
	};
	opts.filters.exclude_water = args.exclude_water;
	opts.filters.exclude_hydrogens = args.exclude_hydrogens;
	opts.filters.exclude_hetatm = args.exclude_hetatm;

	let atoms = pdb::load_atoms_from_path(&args.atoms, &opts)
		.with_context(|| format!("Failed to read atoms from {}", args.atoms.display()))?;

	if args.count && !args.direct {
		println!("{}", site.num_atoms(&atoms, args.min, args.max)?);
		return Ok(());
	}
	let selected: Vec<&Atom> = if args.direct {
		site.atoms_within(&atoms, args.max)
	} else {
		site.atom_list(&atoms, args.min, args.max)?
	};
	log::info!("Selected {} of {} atoms", selected.len(), atoms.len());

	if args.count {
		println!("{}", selected.len());
		return Ok(());
	}
	match &args.output {
		Some(path) => {
			let file = File::create(path)
				.with_context(|| format!("Failed to create {}", path.display()))?;
			let mut w = BufWriter::new(file);
			pdb::write_atoms_pdb(&selected, &mut w)?;
			w.flush()?;
		}
		None => {
			pdb::write_atoms_pdb(&selected, io::stdout().lock())?;
		}
	}
	Ok(())
}

fn export_mrc(site: PathBuf, output: PathBuf) -> Result<()> {
	let site = load_site(&site)?;
	if site.grid_state() == GridState::Unbuilt {
		log::info!("Site was saved without a grid, building it now");
	}
	site.grid()
		.write_to_mrc_file(&output, "dock-site distance grid")
		.with_context(|| format!("Failed to write {}", output.display()))?;
	Ok(())
}

fn export_cavities(site: PathBuf, output: PathBuf) -> Result<()> {
	let site = load_site(&site)?;
	let file = File::create(&output)
		.with_context(|| format!("Failed to create {}", output.display()))?;
	let mut w = BufWriter::new(file);
	pdb::write_cavities_pdb(site.cavities(), &mut w)?;
	w.flush()?;
	log::info!("Wrote {} cavities to {}", site.num_cavities(), output.display());
	Ok(())
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	if !cli.quiet {
		info::print_build_info();
	}

	match cli.command {
		Command::Build(args) => build(args, cli.quiet),
		Command::Info { site } => {
			print!("{}", load_site(&site)?);
			Ok(())
		}
		Command::Filter(args) => filter(args),
		Command::ExportMrc { site, output } => export_mrc(site, output),
		Command::ExportCavities { site, output } => export_cavities(site, output),
	}
}

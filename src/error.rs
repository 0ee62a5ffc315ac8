use thiserror::Error;

/// Errors raised while building, querying or (de)serializing a docking site.
#[derive(Debug, Error)]
pub enum SiteError {
	#[error("invalid distance range: min {min} is greater than max {max}")]
	InvalidRange { min: f64, max: f64 },

	#[error("a docking site needs at least one cavity with at least one coordinate")]
	EmptyCavityInput,

	#[error("malformed docking site stream: {0}")]
	MalformedStream(String),

	#[error("invalid grid configuration: {0}")]
	InvalidGrid(String),

	#[error("I/O operation failed: {source}")]
	Io {
		#[from]
		source: std::io::Error,
	},
}

impl SiteError {
	pub fn malformed(details: impl Into<String>) -> Self {
		Self::MalformedStream(details.into())
	}

	/// Map a read failure, treating a short read as a truncated stream.
	pub fn from_read(err: std::io::Error, what: &str) -> Self {
		if err.kind() == std::io::ErrorKind::UnexpectedEof {
			Self::MalformedStream(format!("truncated while reading {}", what))
		} else {
			Self::Io { source: err }
		}
	}
}

pub type Result<T> = std::result::Result<T, SiteError>;

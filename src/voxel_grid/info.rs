use std::env;
use std::sync::Once;

/// Program name taken from the running executable
pub fn program_name() -> String {
	env::current_exe()
		.ok()
		.as_ref()
		.and_then(|path| path.file_name()) // Extract filename
		.and_then(|name| name.to_str())
		.unwrap_or("dock-site")
		.to_string()
}

/// Print program and build information (only prints once)
pub fn print_build_info() {
	static PRINT_BUILD_ONCE: Once = Once::new();
	PRINT_BUILD_ONCE.call_once(|| {
		eprintln!("Program: {} {}", program_name(), env!("CARGO_PKG_VERSION"));
		eprintln!(
			"Built for: {} ({})\n",
			env!("BUILD_TARGET"),
			env!("BUILD_PROFILE")
		);
	});
}

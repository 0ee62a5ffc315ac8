use std::env;

fn main() {
	let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
	let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

	println!("cargo:rustc-env=BUILD_TARGET={}", target);
	println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
	println!("cargo:rerun-if-changed=build.rs");
}

use std::env;

fn main() {
    // Version string shown by --version and sent in the User-Agent header.
    // Packagers can append a suffix (e.g. a git hash) via ROUTEPICK_BUILD_SUFFIX.
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let full = match env::var("ROUTEPICK_BUILD_SUFFIX") {
        Ok(suffix) if !suffix.is_empty() => format!("{version}+{suffix}"),
        _ => version,
    };
    println!("cargo:rustc-env=ROUTEPICK_VERSION={}", full);

    println!("cargo:rerun-if-env-changed=ROUTEPICK_BUILD_SUFFIX");
    println!("cargo:rerun-if-changed=Cargo.toml");
}

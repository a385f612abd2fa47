//! Embeds a build counter and build time as `NUTRILENS_BUILD_*` env vars.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn read_counter(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let counter = Path::new(COUNTER_FILE);
    let build_number = read_counter(counter) + 1;
    if let Err(e) = fs::write(counter, build_number.to_string()) {
        println!("cargo:warning=build number not saved to {}: {}", COUNTER_FILE, e);
    }

    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=NUTRILENS_BUILD_NUMBER={build_number}");
    println!("cargo:rustc-env=NUTRILENS_BUILD_TIMESTAMP={built_at}");
}

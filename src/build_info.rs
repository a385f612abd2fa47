//! Build metadata embedded by `build.rs`

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

const RAW_BUILD_NUMBER: Option<&str> = option_env!("NUTRILENS_BUILD_NUMBER");
const RAW_BUILD_TIMESTAMP: Option<&str> = option_env!("NUTRILENS_BUILD_TIMESTAMP");

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// 0 when the build script did not run
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: parse_build_number(RAW_BUILD_NUMBER),
            build_timestamp: RAW_BUILD_TIMESTAMP.unwrap_or("unknown"),
        }
    }

    /// `nutrilens 0.3.0 (build 12, 2025-03-15T10:00:00Z)`
    pub fn summary(&self) -> String {
        format!(
            "{} {} (build {}, {})",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }
}

fn parse_build_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Startup banner on stderr; stdout belongs to the MCP transport
pub fn print_startup_banner(component: &str) {
    let rule = "=".repeat(47);
    eprintln!("{rule}");
    eprintln!("  NutriLens {component}");
    eprintln!("  {}", BuildInfo::current().summary());
    eprintln!("{rule}");
}

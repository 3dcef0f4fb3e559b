//! Build information module
//!
//! Compile-time build number and timestamp, embedded by `build.rs`.

use serde::Serialize;

/// Build number, incremented on each recompilation
pub const BUILD_NUMBER: u64 = match option_env!("MYFOOD_BUILD_NUMBER") {
    Some(s) => match parse_u64(s) {
        Some(n) => n,
        None => 0,
    },
    None => 0,
};

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("MYFOOD_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Crate version reported in the banner and in `get_status`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, `myfood`
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `option_env!` yields a string; the build number is parsed at compile time
const fn parse_u64(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut result: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return None;
        }
        result = result * 10 + (b - b'0') as u64;
        i += 1;
    }
    Some(result)
}

/// Snapshot of the compile-time constants, serialized into status responses
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Zero when built without `build.rs` output
    pub build_number: u64,
    /// `unknown` when built without `build.rs` output
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    /// Build info of the running binary
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
        }
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("===============================================");
    eprintln!("  MyFood nutrition analytics");
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("===============================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("4a"), None);
        assert_eq!(parse_u64(""), None);
    }

    #[test]
    fn test_current_reports_crate_identity() {
        let info = BuildInfo::current();
        assert_eq!(info.name, "myfood");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.build_timestamp.is_empty());
    }
}

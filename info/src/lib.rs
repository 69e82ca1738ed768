//! Build metadata reported by the logger and the health check.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The source revision, if the build environment provided one.
pub const REVISION: Option<&str> = option_env!("CHRONOS_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("BUILD_TIMESTAMP");

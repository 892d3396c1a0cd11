use std::path::{Path, PathBuf};

/// Files consulted by [`load_dotenv`], most specific first
///
/// dotenvy never overwrites a variable that is already set, so loading the most
/// specific file first gives it precedence. Real environment variables win over
/// every file.
pub const DOTENV_FILES: [&str; 4] = [".env.testing.local", ".env.testing", ".env.local", ".env"];

/// Load test configuration from `.env` files under `project_root`
///
/// Missing files are skipped. Returns the files that were actually loaded.
pub fn load_dotenv(project_root: &Path) -> Vec<PathBuf> {
    DOTENV_FILES
        .iter()
        .map(|file| project_root.join(file))
        .filter(|path| dotenvy::from_path(path).is_ok())
        .collect()
}

/// Get an environment variable with a default value
///
/// Unset or unparsable values fall back to `default`.
///
/// # Example
/// ```
/// use classy_test::config::env;
///
/// let timeout_ms: u64 = env("CLASSY_TEST_TIMEOUT_MS", 30_000);
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_optional(key).unwrap_or(default)
}

/// Get an optional environment variable
///
/// # Example
/// ```
/// use classy_test::config::env_optional;
///
/// let process: Option<classy_test::Context> = env_optional("CLASSY_PROCESS");
/// ```
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a boolean flag
///
/// Accepts `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, case-insensitively.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

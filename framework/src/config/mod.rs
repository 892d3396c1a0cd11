//! Configuration for test runs
//!
//! Settings come from environment variables, optionally seeded from `.env` files:
//!
//! | Variable                 | Meaning                                   | Default |
//! |--------------------------|-------------------------------------------|---------|
//! | `CLASSY_STRICT`          | warn about repeated completion signals    | `false` |
//! | `CLASSY_PROCESS`         | `client`, `server` or `both`              | `both`  |
//! | `CLASSY_TEST_TIMEOUT_MS` | per-test timeout of the local runner      | `30000` |
//!
//! # Example
//!
//! ```rust,no_run
//! use classy_test::ClassyConfig;
//!
//! let config = ClassyConfig::init(std::path::Path::new("."));
//! println!("running {} tests", config.process);
//! ```

pub mod env;

pub use env::{env, env_optional, load_dotenv};

use crate::context::Context;
use crate::error::ClassyError;
use crate::runner::DEFAULT_TIMEOUT;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const STRICT_KEY: &str = "CLASSY_STRICT";
pub const PROCESS_KEY: &str = "CLASSY_PROCESS";
pub const TIMEOUT_KEY: &str = "CLASSY_TEST_TIMEOUT_MS";

static CONFIG: OnceLock<ClassyConfig> = OnceLock::new();

/// Test run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassyConfig {
    /// Log discarded completion signals as warnings
    pub strict: bool,
    /// Context of the current process
    pub process: Context,
    /// Per-test timeout of [`LocalRunner`](crate::LocalRunner)
    pub test_timeout: Duration,
}

impl ClassyConfig {
    /// Build config from environment variables
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            strict: or_default(Self::strict_from_env(), defaults.strict),
            process: or_default(Self::process_from_env(), defaults.process),
            test_timeout: or_default(Self::timeout_from_env(), defaults.test_timeout),
        }
    }

    /// Like [`from_env`](Self::from_env), but rejects invalid values
    pub fn try_from_env() -> Result<Self, ClassyError> {
        Ok(Self {
            strict: Self::strict_from_env()?,
            process: Self::process_from_env()?,
            test_timeout: Self::timeout_from_env()?,
        })
    }

    /// Load `.env` files under `project_root`, then build and store the global config
    ///
    /// Only the first call loads anything; later calls return the stored config.
    pub fn init(project_root: &Path) -> &'static ClassyConfig {
        CONFIG.get_or_init(|| {
            let loaded = load_dotenv(project_root);
            debug!(files = ?loaded, "loaded test environment");
            Self::from_env()
        })
    }

    /// The global config, built from the environment when [`init`](Self::init) was never called
    pub fn global() -> &'static ClassyConfig {
        CONFIG.get_or_init(Self::from_env)
    }

    /// Create a builder for customizing config
    pub fn builder() -> ClassyConfigBuilder {
        ClassyConfigBuilder::default()
    }

    fn strict_from_env() -> Result<bool, ClassyError> {
        match std::env::var(STRICT_KEY) {
            Ok(value) => {
                env::parse_flag(&value).ok_or_else(|| ClassyError::invalid_config(STRICT_KEY, &value))
            }
            Err(_) => Ok(false),
        }
    }

    fn process_from_env() -> Result<Context, ClassyError> {
        match std::env::var(PROCESS_KEY) {
            Ok(value) => value
                .parse()
                .map_err(|_| ClassyError::invalid_config(PROCESS_KEY, &value)),
            Err(_) => Ok(Context::default()),
        }
    }

    fn timeout_from_env() -> Result<Duration, ClassyError> {
        match std::env::var(TIMEOUT_KEY) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| ClassyError::invalid_config(TIMEOUT_KEY, &value)),
            Err(_) => Ok(DEFAULT_TIMEOUT),
        }
    }
}

fn or_default<T: std::fmt::Debug>(value: Result<T, ClassyError>, default: T) -> T {
    value.unwrap_or_else(|e| {
        warn!(error = %e, ?default, "ignoring invalid config value");
        default
    })
}

impl Default for ClassyConfig {
    fn default() -> Self {
        Self {
            strict: false,
            process: Context::default(),
            test_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Builder for [`ClassyConfig`]
///
/// Fields left unset come from the environment.
#[derive(Debug, Default)]
pub struct ClassyConfigBuilder {
    strict: Option<bool>,
    process: Option<Context>,
    test_timeout: Option<Duration>,
}

impl ClassyConfigBuilder {
    /// Set strict mode
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Set the process context
    pub fn process(mut self, process: Context) -> Self {
        self.process = Some(process);
        self
    }

    /// Set the per-test timeout
    pub fn test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = Some(timeout);
        self
    }

    /// Build the config
    pub fn build(self) -> ClassyConfig {
        let default = ClassyConfig::from_env();
        ClassyConfig {
            strict: self.strict.unwrap_or(default.strict),
            process: self.process.unwrap_or(default.process),
            test_timeout: self.test_timeout.unwrap_or(default.test_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_tracing::capture_logs;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default() {
        let config = ClassyConfig::default();

        assert!(!config.strict);
        assert_eq!(config.process, Context::Both);
        assert_eq!(config.test_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builder_overrides_fields() {
        let config = ClassyConfig::builder()
            .strict(true)
            .process(Context::Client)
            .test_timeout(Duration::from_millis(250))
            .build();

        assert!(config.strict);
        assert_eq!(config.process, Context::Client);
        assert_eq!(config.test_timeout, Duration::from_millis(250));
    }

    // The only test in this binary that touches the CLASSY_* variables.
    #[test]
    fn test_invalid_env_values() {
        std::env::set_var(STRICT_KEY, "yes");
        std::env::set_var(PROCESS_KEY, "browser");
        std::env::set_var(TIMEOUT_KEY, "1500");

        assert_eq!(
            ClassyConfig::try_from_env(),
            Err(ClassyError::invalid_config(PROCESS_KEY, "browser"))
        );
        let (config, logs) = capture_logs(ClassyConfig::from_env);
        assert_eq!(config.process, Context::Both);
        assert!(config.strict);
        assert_eq!(config.test_timeout, Duration::from_millis(1500));
        assert!(logs.contains("WARN"));
        assert!(logs.contains(PROCESS_KEY));

        std::env::set_var(PROCESS_KEY, "server");
        std::env::set_var(TIMEOUT_KEY, "soon");

        assert_eq!(
            ClassyConfig::try_from_env(),
            Err(ClassyError::invalid_config(TIMEOUT_KEY, "soon"))
        );
        let (config, logs) = capture_logs(ClassyConfig::from_env);
        assert_eq!(config.process, Context::Server);
        assert_eq!(config.test_timeout, DEFAULT_TIMEOUT);
        assert!(logs.contains("WARN"));
        assert!(logs.contains(TIMEOUT_KEY));

        std::env::set_var(TIMEOUT_KEY, "1500");
        std::env::set_var(STRICT_KEY, "sometimes");

        assert_eq!(
            ClassyConfig::try_from_env(),
            Err(ClassyError::invalid_config(STRICT_KEY, "sometimes"))
        );
        let (config, logs) = capture_logs(ClassyConfig::from_env);
        assert!(!config.strict);
        assert!(logs.contains(STRICT_KEY));

        std::env::set_var(STRICT_KEY, "off");

        assert_eq!(
            ClassyConfig::try_from_env(),
            Ok(ClassyConfig {
                strict: false,
                process: Context::Server,
                test_timeout: Duration::from_millis(1500),
            })
        );

        for key in [STRICT_KEY, PROCESS_KEY, TIMEOUT_KEY] {
            std::env::remove_var(key);
        }
    }
}

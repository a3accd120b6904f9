//! Console subscriber installation
//!
//! `init` installs the process-wide console subscriber once. Database log
//! rows are handled separately by the store's log layer.

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output style of the console subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable lines, sqlmy crates at debug
    #[default]
    Development,
    /// One JSON object per event, sqlmy crates at info
    Production,
    /// Bare registry; tests install `init_test_capture` instead
    Test,
}

impl Profile {
    pub fn default_level(&self) -> &'static str {
        match self {
            Profile::Development => "debug",
            Profile::Production => "info",
            Profile::Test => "off",
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> String {
        directive(self.default_level())
    }
}

/// Directive enabling the sqlmy crates at `level`
pub fn directive(level: &str) -> String {
    format!("sqlmy={}", level)
}

static INSTALLED: Once = Once::new();

/// Install the console subscriber for `profile`
///
/// Only the first call in a process has an effect. `RUST_LOG` overrides the
/// profile's level.
pub fn init(profile: Profile) {
    install(profile, profile.default_level());
}

/// Install the console subscriber with an explicit sqlmy level
///
/// Same one-shot rule as `init`.
pub fn init_with_level(profile: Profile, level: &str) {
    install(profile, level);
}

fn install(profile: Profile, level: &str) {
    INSTALLED.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|e| e.to_string()),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .try_init()
                .map_err(|e| e.to_string()),
            Profile::Test => tracing_subscriber::registry()
                .try_init()
                .map_err(|e| e.to_string()),
        };
        if let Err(reason) = installed {
            eprintln!("sqlmy: console logging not installed: {}", reason);
        }
    });
}

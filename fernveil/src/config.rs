//! Command line and environment configuration.

use std::path::PathBuf;

/// Environment variable naming the storage directory.
pub const DATA_DIR_ENV: &str = "FERNVEIL_DATA_DIR";

const DEFAULT_DATA_DIR: &str = ".fernveil";

/// Settings for a console session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Directory holding the progression file.
    pub data_dir: PathBuf,
    /// Seed for scans; random when unset.
    pub seed: Option<u64>,
    pub show_help: bool,
}

impl ConsoleConfig {
    /// Build from arguments, falling back to `env_data_dir` and then the default.
    ///
    /// Unknown arguments and unparsable values are ignored.
    pub fn from_args(args: &[String], env_data_dir: Option<String>) -> Self {
        let mut config = Self {
            data_dir: env_data_dir
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            seed: None,
            show_help: false,
        };

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--data-dir" => {
                    if let Some(dir) = args.get(i + 1) {
                        config.data_dir = PathBuf::from(dir);
                        i += 1;
                    }
                }
                "--seed" => {
                    if let Some(seed) = args.get(i + 1) {
                        config.seed = seed.parse().ok();
                        i += 1;
                    }
                }
                "--help" | "-h" => config.show_help = true,
                _ => {}
            }
            i += 1;
        }

        config
    }
}

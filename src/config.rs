//! User configuration loaded from `config.toml`.
//!
//! Problems with the file never abort the program: they are returned as
//! warnings and the defaults are used instead.

use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;
use serde::Deserialize;
use tabula_engine::formula::{DEFAULT_MAX_DEPTH, ParseOptions};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

/// What to print once the script has run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Values,
    Texts,
    None,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "values" => Ok(OutputMode::Values),
            "texts" => Ok(OutputMode::Texts),
            "none" => Ok(OutputMode::None),
            other => Err(format!(
                "Unknown output mode: {} (expected values, texts or none)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputMode,
    /// Log filter directives, e.g. `"tabula_core=debug"`.
    pub log: Option<String>,
    pub max_formula_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output: OutputMode::default(),
            log: None,
            max_formula_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_formula_depth,
        }
    }
}

/// Load the config from `config_file`, or from the user config dir when
/// none is given.
pub fn load_config(config_file: Option<&PathBuf>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.cloned().or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(config) => Some(config),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn parse_config(content: &str) -> Result<Config, String> {
    let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
    if config.max_formula_depth == 0 {
        return Err("max_formula_depth must be at least 1".to_string());
    }
    Ok(config)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabula")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

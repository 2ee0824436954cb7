//! Configuration for bookshelf.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BOOKSHELF_HOME, BOOKSHELF_FILE)
//! 2. Config file (.bookshelf/config.yaml)
//! 3. Defaults (~/.bookshelf/library.txt, 1000 books, years 1000-2024)
//!
//! Config file discovery:
//! - Searches current directory and parents for .bookshelf/config.yaml
//! - `paths.home` is relative to the .bookshelf/ directory
//! - `paths.data_file` is relative to the directory containing .bookshelf/

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::library::DEFAULT_CAPACITY;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Name of the data file inside the home directory
pub const DEFAULT_DATA_FILE: &str = "library.txt";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub years: Option<YearsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .bookshelf/)
    pub home: Option<String>,
    /// Backing file (relative to the project root)
    pub data_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YearsConfig {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

/// Inclusive range of accepted publication years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: 1000,
            max: 2024,
        }
    }
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Bookshelf home directory
    pub home: PathBuf,
    /// Backing file for the catalog
    pub data_file: PathBuf,
    /// Maximum number of books
    pub capacity: usize,
    /// Accepted publication years
    pub years: YearRange,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Environment overrides, captured once so resolution stays testable
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<PathBuf>,
    data_file: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("BOOKSHELF_HOME").ok().map(PathBuf::from),
            data_file: std::env::var("BOOKSHELF_FILE").ok().map(PathBuf::from),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".bookshelf").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Combine defaults, an optional config file and env overrides
fn resolve(
    default_home: PathBuf,
    env: EnvOverrides,
    config_file: Option<(PathBuf, ConfigFile)>,
) -> Result<ResolvedConfig> {
    let mut home = default_home;
    let mut data_file = None;
    let mut capacity = DEFAULT_CAPACITY;
    let mut years = YearRange::default();
    let mut config_path = None;

    if let Some((path, config)) = config_file {
        // .bookshelf/ and the project root that contains it
        let shelf_dir = path.parent().unwrap_or(Path::new("."));
        let base_dir = shelf_dir.parent().unwrap_or(Path::new("."));

        if let Some(ref home_path) = config.paths.home {
            home = resolve_path(shelf_dir, home_path);
        }
        data_file = config
            .paths
            .data_file
            .as_deref()
            .map(|p| resolve_path(base_dir, p));

        if let Some(cap) = config.catalog.as_ref().and_then(|c| c.capacity) {
            capacity = cap;
        }
        if let Some(y) = config.years {
            years.min = y.min.unwrap_or(years.min);
            years.max = y.max.unwrap_or(years.max);
        }

        config_path = Some(path);
    }

    if let Some(env_home) = env.home {
        home = env_home;
    }
    let data_file = env
        .data_file
        .or(data_file)
        .unwrap_or_else(|| home.join(DEFAULT_DATA_FILE));

    if years.min > years.max {
        anyhow::bail!(
            "Invalid year range in config: min {} is greater than max {}",
            years.min,
            years.max
        );
    }

    Ok(ResolvedConfig {
        home,
        data_file,
        capacity,
        years,
        config_file: config_path,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".bookshelf");

    let config_file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    resolve(default_home, EnvOverrides::from_env(), config_file)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> ConfigFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = resolve(
            PathBuf::from("/home/reader/.bookshelf"),
            EnvOverrides::default(),
            None,
        )
        .unwrap();

        assert_eq!(config.home, PathBuf::from("/home/reader/.bookshelf"));
        assert_eq!(
            config.data_file,
            PathBuf::from("/home/reader/.bookshelf/library.txt")
        );
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.years, YearRange { min: 1000, max: 2024 });
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let shelf_dir = temp.path().join(".bookshelf");
        std::fs::create_dir_all(&shelf_dir).unwrap();

        let config_path = shelf_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./
  data_file: data/books.txt
catalog:
  capacity: 50
years:
  max: 2030
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./".to_string()));
        assert_eq!(config.paths.data_file, Some("data/books.txt".to_string()));
        assert_eq!(config.catalog.unwrap().capacity, Some(50));
        let years = config.years.unwrap();
        assert_eq!(years.min, None);
        assert_eq!(years.max, Some(2030));
    }

    #[test]
    fn test_config_file_paths_are_relative() {
        let config = parse(
            r#"
version: "1.0"
paths:
  home: state
  data_file: books.txt
catalog:
  capacity: 10
years:
  min: 1450
"#,
        );

        let resolved = resolve(
            PathBuf::from("/default"),
            EnvOverrides::default(),
            Some((PathBuf::from("/project/.bookshelf/config.yaml"), config)),
        )
        .unwrap();

        assert_eq!(resolved.home, PathBuf::from("/project/.bookshelf/state"));
        assert_eq!(resolved.data_file, PathBuf::from("/project/books.txt"));
        assert_eq!(resolved.capacity, 10);
        assert_eq!(resolved.years, YearRange { min: 1450, max: 2024 });
        assert_eq!(
            resolved.config_file,
            Some(PathBuf::from("/project/.bookshelf/config.yaml"))
        );
    }

    #[test]
    fn test_env_overrides_config_file() {
        let config = parse(
            r#"
version: "1.0"
paths:
  data_file: books.txt
"#,
        );
        let env = EnvOverrides {
            home: Some(PathBuf::from("/env/home")),
            data_file: Some(PathBuf::from("/env/books.txt")),
        };

        let resolved = resolve(
            PathBuf::from("/default"),
            env,
            Some((PathBuf::from("/project/.bookshelf/config.yaml"), config)),
        )
        .unwrap();

        assert_eq!(resolved.home, PathBuf::from("/env/home"));
        assert_eq!(resolved.data_file, PathBuf::from("/env/books.txt"));
    }

    #[test]
    fn test_env_home_moves_default_data_file() {
        let env = EnvOverrides {
            home: Some(PathBuf::from("/env/home")),
            data_file: None,
        };

        let resolved = resolve(PathBuf::from("/default"), env, None).unwrap();
        assert_eq!(resolved.data_file, PathBuf::from("/env/home/library.txt"));
    }

    #[test]
    fn test_inverted_year_range_rejected() {
        let config = parse(
            r#"
version: "1.0"
years:
  min: 2000
  max: 1999
"#,
        );

        let result = resolve(
            PathBuf::from("/default"),
            EnvOverrides::default(),
            Some((PathBuf::from("/project/.bookshelf/config.yaml"), config)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_year_range_contains() {
        let years = YearRange::default();
        assert!(years.contains(1000));
        assert!(years.contains(2024));
        assert!(!years.contains(999));
        assert!(!years.contains(2025));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::BenchError;

pub const DEFAULT_BENCHMARKS_ROOT: &str = "lqcd-benchmarks";
pub const DEFAULT_MATRICES_FOLDER: &str = "matrices";

pub const ENV_SHARED_LIBS: &str = "SHARED_LIBS";
pub const ENV_MATRICES_FOLDER: &str = "MATRICES_FOLDER";
pub const ENV_BENCHMARKS_ROOT: &str = "JITBENCH_ROOT";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub benchmarks_root: Option<PathBuf>,
    pub matrices_folder: Option<String>,
    pub repeat: Option<usize>,
    pub warmup: Option<usize>,
    pub shared_libs: Option<Vec<PathBuf>>,
}

/// Environment variables that feed the configuration.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub shared_libs: Option<String>,
    pub matrices_folder: Option<String>,
    pub benchmarks_root: Option<String>,
}

impl EnvConfig {
    pub fn from_process() -> EnvConfig {
        EnvConfig {
            shared_libs: std::env::var(ENV_SHARED_LIBS).ok(),
            matrices_folder: std::env::var(ENV_MATRICES_FOLDER).ok(),
            benchmarks_root: std::env::var(ENV_BENCHMARKS_ROOT).ok(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub benchmarks_root: Option<PathBuf>,
    pub matrices_folder: Option<String>,
    pub repeat: Option<usize>,
    pub warmup: Option<usize>,
    pub shared_libs: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub benchmarks_root: PathBuf,
    pub matrices_folder: String,
    pub repeat: usize,
    pub warmup: usize,
    pub shared_libs: Vec<PathBuf>,
}

impl Settings {
    /// Layer defaults, then the config file, then the environment, then the CLI.
    pub fn resolve(file: FileConfig, env: &EnvConfig, cli: &CliOverrides) -> Result<Settings, BenchError> {
        let benchmarks_root = cli
            .benchmarks_root
            .clone()
            .or_else(|| env.benchmarks_root.as_ref().map(PathBuf::from))
            .or(file.benchmarks_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BENCHMARKS_ROOT));

        let matrices_folder = cli
            .matrices_folder
            .clone()
            .or_else(|| env.matrices_folder.clone())
            .or(file.matrices_folder)
            .unwrap_or_else(|| DEFAULT_MATRICES_FOLDER.to_string());

        let shared_libs = match (&cli.shared_libs, &env.shared_libs) {
            (Some(list), _) | (None, Some(list)) => split_shared_libs(list),
            (None, None) => file.shared_libs.unwrap_or_default(),
        };

        let repeat = cli.repeat.or(file.repeat).unwrap_or(1);
        if repeat == 0 {
            return Err(BenchError::InvalidRepeat { repeat });
        }
        let warmup = cli.warmup.or(file.warmup).unwrap_or(0);

        Ok(Settings {
            benchmarks_root,
            matrices_folder,
            repeat,
            warmup,
            shared_libs,
        })
    }
}

/// Split a comma-separated library list. Empty entries are dropped, so an
/// empty string yields no libraries.
pub fn split_shared_libs(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// `~/.config/jitbench/config.toml` (platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jitbench").join("config.toml"))
}

/// Read the config file. An explicit path must exist; the default location
/// is optional.
pub fn load_config_file(explicit: Option<&Path>) -> Result<FileConfig, BenchError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.is_file() => p,
            _ => return Ok(FileConfig::default()),
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|source| BenchError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    parse_config(&text, &path)
}

pub fn parse_config(text: &str, path: &Path) -> Result<FileConfig, BenchError> {
    toml::from_str(text).map_err(|e| BenchError::ConfigParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// On-disk locations of one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPaths {
    /// `<root>/<folder>/<function>.mlir`, the reference program source.
    pub program: PathBuf,
    /// The program path with `.npz` appended.
    pub archive: PathBuf,
}

impl BenchmarkPaths {
    pub fn resolve(settings: &Settings, function_name: &str) -> BenchmarkPaths {
        let program = settings
            .benchmarks_root
            .join(&settings.matrices_folder)
            .join(format!("{}.mlir", function_name));
        let mut archive = program.clone().into_os_string();
        archive.push(".npz");
        BenchmarkPaths {
            program,
            archive: PathBuf::from(archive),
        }
    }
}

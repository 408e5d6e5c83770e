use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use jitbench::config::{self, BenchmarkPaths, CliOverrides, EnvConfig, Settings};
use jitbench::display;
use jitbench::engine;
use jitbench::errors::BenchError;
use jitbench::harness::{self, BenchmarkRequest};
use jitbench::types::OutputFormat;

const MEDIAN_RUNS: usize = 5;

#[derive(Parser)]
#[command(
    name = "jitbench",
    version,
    about = "Run a JIT-compiled MLIR benchmark read from stdin and print its time in seconds"
)]
struct Cli {
    /// Benchmark (function) name; selects <root>/<folder>/<name>.mlir and its .npz archive
    function_name: Option<String>,

    /// Number of timed invocations
    #[arg(short, long, conflicts_with = "median")]
    repeat: Option<usize>,

    /// Take five timed invocations and report their median
    #[arg(long)]
    median: bool,

    /// Untimed invocations before the timed ones
    #[arg(long)]
    warmup: Option<usize>,

    /// Benchmarks root directory [env: JITBENCH_ROOT] [default: lqcd-benchmarks]
    #[arg(long)]
    root: Option<PathBuf>,

    /// Sub-folder holding the benchmark [env: MATRICES_FOLDER] [default: matrices]
    #[arg(long)]
    folder: Option<String>,

    /// Comma-separated shared libraries to load into the engine [env: SHARED_LIBS]
    #[arg(long)]
    shared_libs: Option<String>,

    /// Config file (default: <config dir>/jitbench/config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "plain")]
    format: OutputFormat,

    #[arg(long)]
    json: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut program_text = String::new();
    std::io::stdin()
        .read_to_string(&mut program_text)
        .map_err(|source| BenchError::StdinRead { source })?;

    let function_name = harness::validate_inputs(&program_text, cli.function_name.as_deref())?;

    let file_config = config::load_config_file(cli.config.as_deref())?;
    let overrides = CliOverrides {
        benchmarks_root: cli.root.clone(),
        matrices_folder: cli.folder.clone(),
        repeat: if cli.median { Some(MEDIAN_RUNS) } else { cli.repeat },
        warmup: cli.warmup,
        shared_libs: cli.shared_libs.clone(),
    };
    let settings = Settings::resolve(file_config, &EnvConfig::from_process(), &overrides)?;
    let paths = BenchmarkPaths::resolve(&settings, function_name);

    let request = BenchmarkRequest {
        function_name,
        program_text: &program_text,
        paths,
        settings,
    };
    let report = harness::run(&engine::default_compiler(), &request)
        .with_context(|| format!("benchmark '{}' failed", function_name))?;

    print!("{}", display::render(&report, cli.format, cli.json));

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        match err.downcast_ref::<BenchError>() {
            Some(bench) if bench.is_input_error() => eprintln!("{}", bench),
            _ => eprintln!("Error: {:#}", err),
        }
        process::exit(1);
    }
}

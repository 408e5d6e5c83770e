use std::time::Instant;

use chrono::Utc;
use log::{debug, info};

use crate::archive;
use crate::call::CallArguments;
use crate::config::{BenchmarkPaths, Settings};
use crate::engine::{ENTRY_POINT, ExecutionEngine, JitCompiler};
use crate::errors::BenchError;
use crate::order;
use crate::stats;
use crate::types::{ArraySet, BenchReport, Measurement};

/// Everything one benchmark run needs.
#[derive(Debug, Clone)]
pub struct BenchmarkRequest<'a> {
    pub function_name: &'a str,
    /// Text handed to the compiler (stdin).
    pub program_text: &'a str,
    pub paths: BenchmarkPaths,
    pub settings: Settings,
}

/// Check the two required inputs before anything touches the disk.
pub fn validate_inputs<'a>(program_text: &str, function_name: Option<&'a str>) -> Result<&'a str, BenchError> {
    if program_text.is_empty() {
        return Err(BenchError::EmptyProgram);
    }
    match function_name {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(BenchError::MissingFunctionName),
    }
}

/// Compile, bind the archive's arrays and time the entry point.
///
/// The argument order is computed against the on-disk program that ships
/// with the archive, not the compiled text: the compiled text may be a
/// transformed variant whose value names no longer line up.
pub fn run<C: JitCompiler>(compiler: &C, request: &BenchmarkRequest<'_>) -> Result<BenchReport, BenchError> {
    if request.program_text.is_empty() {
        return Err(BenchError::EmptyProgram);
    }
    let started_at = Utc::now();

    info!(
        "compiling '{}' ({} bytes, {} shared libs)",
        request.function_name,
        request.program_text.len(),
        request.settings.shared_libs.len()
    );
    let engine = compiler.compile(request.program_text, &request.settings.shared_libs)?;

    let reference =
        std::fs::read_to_string(&request.paths.program).map_err(|source| BenchError::ProgramRead {
            path: request.paths.program.clone(),
            source,
        })?;

    info!("loading arrays from {}", request.paths.archive.display());
    let mut arrays = archive::load_archive(&request.paths.archive)?;
    let order = order::argument_order(&reference, arrays.names())?;

    let runs = measure(
        &engine,
        &mut arrays,
        &order,
        request.settings.repeat,
        request.settings.warmup,
    )?;
    let seconds = report_value(&runs).ok_or(BenchError::InvalidRepeat { repeat: 0 })?;

    Ok(BenchReport {
        function_name: request.function_name.to_string(),
        entry_point: ENTRY_POINT.to_string(),
        started_at,
        arguments: order,
        warmup: request.settings.warmup,
        runs,
        seconds,
    })
}

/// Invoke the entry point `warmup` times untimed, then `repeat` times timed.
///
/// One set of call arguments, and so one timing slot, serves every
/// invocation. Invocations are strictly sequential.
pub fn measure<E: ExecutionEngine>(
    engine: &E,
    arrays: &mut ArraySet,
    order: &[String],
    repeat: usize,
    warmup: usize,
) -> Result<Vec<Measurement>, BenchError> {
    if repeat == 0 {
        return Err(BenchError::InvalidRepeat { repeat });
    }

    let mut args = CallArguments::bind(arrays, order)?;
    info!(
        "invoking '{}' with {} arguments ({} warm-up, {} timed)",
        ENTRY_POINT,
        args.len(),
        warmup,
        repeat
    );

    for _ in 0..warmup {
        unsafe { engine.invoke_packed(ENTRY_POINT, args.packed())? };
    }

    let mut runs = Vec::with_capacity(repeat);
    for i in 0..repeat {
        let start = Instant::now();
        unsafe { engine.invoke_packed(ENTRY_POINT, args.packed())? };
        let wall_seconds = start.elapsed().as_secs_f64();

        let measurement = Measurement {
            seconds: args.timing_seconds(),
            wall_seconds,
        };
        debug!(
            "run {}/{}: {} s (wall {} s)",
            i + 1,
            repeat,
            measurement.seconds,
            measurement.wall_seconds
        );
        runs.push(measurement);
    }

    Ok(runs)
}

/// The single measurement, or the median of several.
pub fn report_value(runs: &[Measurement]) -> Option<f64> {
    match runs {
        [] => None,
        [only] => Some(only.seconds),
        _ => {
            let samples: Vec<f64> = runs.iter().map(|m| m.seconds).collect();
            stats::median(&samples)
        }
    }
}

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("No input code was received on stdin")]
    EmptyProgram,

    #[error("Function name is required. Usage: jitbench <function-name> < program.mlir")]
    MissingFunctionName,

    #[error("Repeat count must be at least 1 (got {repeat})")]
    InvalidRepeat { repeat: usize },

    #[error("Failed to read program source from stdin: {source}")]
    StdinRead { source: std::io::Error },

    #[error("Failed to read program file {path}: {source}")]
    ProgramRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read archive {path}: {detail}")]
    ArchiveRead { path: PathBuf, detail: String },

    #[error("Malformed array '{member}' in archive {path}: {detail}")]
    ArchiveFormat {
        path: PathBuf,
        member: String,
        detail: String,
    },

    #[error("Failed to compile program: {detail}")]
    Compile { detail: String },

    #[error("No execution engine available: jitbench was built without the `mlir` feature")]
    EngineUnavailable,

    #[error("Array '{name}' from the archive does not occur in the program source")]
    UnresolvedArgument { name: String },

    #[error("Invocation of '{entry_point}' failed: {detail}")]
    Invoke { entry_point: String, detail: String },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },
}

impl BenchError {
    /// Missing or invalid user input. These are reported as a plain
    /// diagnostic, everything else carries its full context chain.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BenchError::EmptyProgram
                | BenchError::MissingFunctionName
                | BenchError::InvalidRepeat { .. }
        )
    }
}

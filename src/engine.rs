//! The compiler collaborator.
//!
//! Parsing, code generation and execution all belong to an external JIT.
//! The harness only needs two things from it: turn program text into
//! something invocable, and call a named entry point with packed arguments.

use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr::NonNull;

use crate::errors::BenchError;

/// Entry point every benchmark module exports.
pub const ENTRY_POINT: &str = "main";

pub trait ExecutionEngine {
    /// Call `name` through the packed interface: `args[i]` is the address of
    /// the i-th argument value.
    ///
    /// # Safety
    /// Every slot must point at a live value of the type the compiled
    /// function expects at that position. A mismatch is undefined behaviour.
    unsafe fn invoke_packed(&self, name: &str, args: &mut [*mut c_void]) -> Result<(), BenchError>;
}

pub trait JitCompiler {
    type Engine: ExecutionEngine;

    /// Parse `source` and build an engine linked against `shared_libs`.
    fn compile(&self, source: &str, shared_libs: &[PathBuf]) -> Result<Self::Engine, BenchError>;
}

/// Stand-in used when no JIT backend was compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl ExecutionEngine for Unavailable {
    unsafe fn invoke_packed(&self, _name: &str, _args: &mut [*mut c_void]) -> Result<(), BenchError> {
        Err(BenchError::EngineUnavailable)
    }
}

impl JitCompiler for Unavailable {
    type Engine = Unavailable;

    fn compile(&self, _source: &str, _shared_libs: &[PathBuf]) -> Result<Unavailable, BenchError> {
        Err(BenchError::EngineUnavailable)
    }
}

/// Rejects the null handle a JIT hands back when it could not build an
/// engine. Invoking through such a handle faults inside native code.
pub fn require_engine<T>(handle: *mut T) -> Result<NonNull<T>, BenchError> {
    NonNull::new(handle).ok_or_else(|| BenchError::Compile {
        detail: "failed to create execution engine".to_string(),
    })
}

#[cfg(feature = "mlir")]
pub mod mlir {
    use std::ffi::c_void;
    use std::os::raw::c_char;
    use std::path::PathBuf;

    use log::info;
    use melior::dialect::DialectRegistry;
    use melior::ir::Module;
    use melior::utility::{register_all_dialects, register_all_llvm_translations};
    use melior::Context;
    use mlir_sys::{
        MlirExecutionEngine, MlirStringRef, mlirExecutionEngineCreate, mlirExecutionEngineDestroy,
        mlirExecutionEngineInvokePacked,
    };

    use super::{ExecutionEngine, JitCompiler, require_engine};
    use crate::errors::BenchError;

    const OPTIMIZATION_LEVEL: i32 = 2;

    /// Modules export `<name>` through `llvm.emit_c_interface`, which takes
    /// memrefs as descriptor pointers. Its packed wrapper is what gets called.
    const C_INTERFACE_PREFIX: &str = "_mlir_ciface_";

    /// JIT backed by MLIR's own execution engine.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MlirCompiler;

    /// A compiled module. Owns the native engine handle, which is never null.
    pub struct MlirEngine {
        raw: MlirExecutionEngine,
    }

    fn string_ref(s: &str) -> MlirStringRef {
        MlirStringRef {
            data: s.as_ptr() as *const c_char,
            length: s.len(),
        }
    }

    impl JitCompiler for MlirCompiler {
        type Engine = MlirEngine;

        fn compile(&self, source: &str, shared_libs: &[PathBuf]) -> Result<MlirEngine, BenchError> {
            let registry = DialectRegistry::new();
            register_all_dialects(&registry);

            let context = Context::new();
            context.append_dialect_registry(&registry);
            context.load_all_available_dialects();
            register_all_llvm_translations(&context);

            let libs: Vec<String> = shared_libs
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let lib_refs: Vec<MlirStringRef> = libs.iter().map(|l| string_ref(l)).collect();

            let raw = {
                let module = Module::parse(&context, source).ok_or_else(|| BenchError::Compile {
                    detail: "MLIR parser rejected the module (see diagnostics above)".to_string(),
                })?;
                info!("parsed module, creating execution engine with {} shared libs", lib_refs.len());
                unsafe {
                    mlirExecutionEngineCreate(
                        module.to_raw(),
                        OPTIMIZATION_LEVEL,
                        lib_refs.len() as i32,
                        lib_refs.as_ptr(),
                        false,
                    )
                }
            };
            drop(context);

            require_engine(raw.ptr)?;
            Ok(MlirEngine { raw })
        }
    }

    impl ExecutionEngine for MlirEngine {
        unsafe fn invoke_packed(&self, name: &str, args: &mut [*mut c_void]) -> Result<(), BenchError> {
            let symbol = format!("{}{}", C_INTERFACE_PREFIX, name);
            let result =
                unsafe { mlirExecutionEngineInvokePacked(self.raw, string_ref(&symbol), args.as_mut_ptr()) };
            if result.value == 0 {
                return Err(BenchError::Invoke {
                    entry_point: name.to_string(),
                    detail: format!("no packed entry point for `{}` (is it marked llvm.emit_c_interface?)", symbol),
                });
            }
            Ok(())
        }
    }

    impl Drop for MlirEngine {
        fn drop(&mut self) {
            unsafe { mlirExecutionEngineDestroy(self.raw) }
        }
    }
}

/// The backend the binary runs with.
#[cfg(feature = "mlir")]
pub fn default_compiler() -> mlir::MlirCompiler {
    mlir::MlirCompiler
}

#[cfg(not(feature = "mlir"))]
pub fn default_compiler() -> Unavailable {
    Unavailable
}

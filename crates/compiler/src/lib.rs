//! Norn Compiler Library
//!
//! Compiles Norn source text to native x86-64 Linux executables in
//! five stages: tokenizing, parsing, type checking, IR generation and
//! assembly emission. The final link shells out to the system C
//! compiler driver with the embedded runtime library.
//!
//! # Extending the Compiler
//!
//! Embedders can expose additional runtime functions through
//! [`CompilerConfig`]:
//!
//! ```rust,ignore
//! use nornc::{CompilerConfig, ExternalFunction, FunctionType, Type};
//!
//! let config = CompilerConfig::new()
//!     .with_external(ExternalFunction::new(
//!         "print_hex",
//!         "my_runtime_print_hex",
//!         FunctionType { params: vec![Type::Int], result: Type::Unit },
//!     ))
//!     .with_library("myruntime");
//!
//! nornc::compile_file_with_config(source, output, false, &config)?;
//! ```

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod config;
pub mod ir;
pub mod ir_generator;
pub mod parser;
pub mod symbol_table;
pub mod tokenizer;
pub mod typechecker;
pub mod types;

pub use ast::{Expr, Expression, Module, TypedExpr};
pub use codegen::{AsmGen, CodeGenError};
pub use config::{CompilerConfig, ExternalFunction};
pub use ir::{Instruction, IrFunction};
pub use parser::Parser;
pub use tokenizer::{Token, TokenKind, tokenize};
pub use typechecker::TypeChecker;
pub use types::{FunctionType, Type};

use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::process::Command;

/// Embedded runtime static library (located by build.rs). Extracted to
/// a temp file for the link step of every `compile_file` call.
static RUNTIME_LIB: &[u8] = include_bytes!(env!("NORN_RUNTIME_LIB_PATH"));

const RUNTIME_LIB_FILENAME: &str = "libnorn_runtime.a";

/// Run the front end: tokens, AST, typed AST.
fn front_end(source: &str, config: &CompilerConfig) -> Result<Module<Type>, String> {
    let tokens = tokenize(source)?;
    let module = Parser::new(tokens).parse_module()?;
    let mut checker = TypeChecker::new();
    checker.register_external_functions(config.external_signatures())?;
    checker.check_module(module)
}

/// Check a source string without generating code.
pub fn check_source(source: &str, config: &CompilerConfig) -> Result<(), String> {
    front_end(source, config).map(|_| ())
}

/// Compile a source string down to assembly text.
pub fn compile_to_asm(source: &str, config: &CompilerConfig) -> Result<String, String> {
    let module = front_end(source, config)?;
    let functions = ir_generator::generate_ir(&module)?;
    let mut asmgen = AsmGen::new();
    asmgen
        .codegen_program(&functions, config)
        .map_err(|e| e.to_string())
}

/// Compile a Norn source file to a native executable.
pub fn compile_file(source_path: &Path, output_path: &Path, keep_asm: bool) -> Result<(), String> {
    compile_file_with_config(source_path, output_path, keep_asm, &CompilerConfig::default())
}

/// Compile a Norn source file to a native executable with a custom
/// configuration.
///
/// The generated assembly is written to the output path with an `.s`
/// extension, handed to the C compiler driver together with the
/// runtime library, and removed afterwards unless `keep_asm` is set.
pub fn compile_file_with_config(
    source_path: &Path,
    output_path: &Path,
    keep_asm: bool,
    config: &CompilerConfig,
) -> Result<(), String> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| format!("failed to read {}: {}", source_path.display(), e))?;

    let asm = compile_to_asm(&source, config)?;

    let asm_path = output_path.with_extension("s");
    fs::write(&asm_path, &asm)
        .map_err(|e| format!("failed to write {}: {}", asm_path.display(), e))?;

    let cc = config.cc.as_deref().unwrap_or("cc");
    check_cc_available(cc)?;

    // Extract the embedded runtime library for the link step.
    let runtime_dir = std::env::temp_dir();
    let runtime_path = runtime_dir.join(RUNTIME_LIB_FILENAME);
    fs::File::create(&runtime_path)
        .and_then(|mut file| file.write_all(RUNTIME_LIB))
        .map_err(|e| format!("failed to extract runtime library: {}", e))?;

    let mut link = Command::new(cc);
    link.arg(&asm_path)
        .arg("-o")
        .arg(output_path)
        .arg("-L")
        .arg(&runtime_dir)
        .arg("-lnorn_runtime");
    for path in &config.library_paths {
        link.arg("-L").arg(path);
    }
    for library in &config.libraries {
        link.arg("-l").arg(library);
    }

    let result = link
        .output()
        .map_err(|e| format!("failed to run {}: {}", cc, e));

    fs::remove_file(&runtime_path).ok();
    let output = result?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("assembling/linking failed:\n{}", stderr));
    }

    if !keep_asm {
        fs::remove_file(&asm_path).ok();
    }
    Ok(())
}

/// Verify the C compiler driver exists before trying to link with it,
/// so a missing toolchain produces a helpful message instead of a raw
/// spawn error mid-build.
fn check_cc_available(cc: &str) -> Result<(), String> {
    let output = Command::new(cc).arg("--version").output().map_err(|e| {
        format!(
            "failed to run '{}': {}. A C compiler driver (gcc or clang) \
             is required to assemble and link the generated code.",
            cc, e
        )
    })?;
    if !output.status.success() {
        return Err(format!(
            "'{} --version' exited with {:?}: {}",
            cc,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

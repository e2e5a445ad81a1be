//! Norn Compiler CLI
//!
//! Command-line interface for compiling Norn programs to native
//! executables and running front-end checks.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use nornc::CompilerConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "nornc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Norn compiler - compile Norn programs to native executables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to an executable
    Build {
        /// Input source file
        input: PathBuf,

        /// Output executable path (defaults to the input stem suffixed
        /// with `_out`)
        output: Option<PathBuf>,

        /// Keep the intermediate assembly file (.s)
        #[arg(long)]
        keep_asm: bool,

        /// Compiler configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Parse and type check a source file without generating code
    Check {
        /// Input source file
        input: PathBuf,

        /// Compiler configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            keep_asm,
            config,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input));
            let config = load_config(config.as_deref());
            run_build(&input, &output, keep_asm, &config);
        }
        Commands::Check { input, config } => {
            let config = load_config(config.as_deref());
            run_check(&input, &config);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nornc", &mut io::stdout());
        }
    }
}

/// Default output name: the input stem suffixed with `_out`.
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a".to_string());
    PathBuf::from(format!("{}_out", stem))
}

fn load_config(path: Option<&Path>) -> CompilerConfig {
    let Some(path) = path else {
        return CompilerConfig::default();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading config {}: {}", path.display(), e);
            process::exit(1);
        }
    };
    match CompilerConfig::from_toml(&text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error in config {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_build(input: &Path, output: &Path, keep_asm: bool, config: &CompilerConfig) {
    match nornc::compile_file_with_config(input, output, keep_asm, config) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
            if keep_asm {
                let asm_path = output.with_extension("s");
                if asm_path.exists() {
                    println!("Assembly saved to {}", asm_path.display());
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_check(input: &Path, config: &CompilerConfig) {
    let source = match std::fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    };
    match nornc::check_source(&source, config) {
        Ok(()) => println!("{}: no errors", input.display()),
        Err(e) => {
            eprintln!("{}: {}", input.display(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output(Path::new("examples/fib.norn")),
            PathBuf::from("fib_out")
        );
        assert_eq!(default_output(Path::new("loop")), PathBuf::from("loop_out"));
    }
}

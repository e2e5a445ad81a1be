//! Compiler configuration
//!
//! Lets embedders and build scripts extend the compiler without
//! touching its core: extra runtime functions (type checked and
//! declared as externs like the builtin I/O), extra link inputs, and a
//! different C compiler driver. The same structure can be loaded from
//! a TOML file via `--config`:
//!
//! ```toml
//! cc = "clang"
//! libraries = ["m"]
//!
//! [[extern]]
//! name = "print_hex"
//! symbol = "norn_ext_print_hex"
//! params = ["Int"]
//! result = "Unit"
//! ```

use crate::types::{FunctionType, Type};
use serde::Deserialize;
use std::collections::HashMap;

/// A runtime function provided outside the standard runtime library.
///
/// The `name` is what Norn source calls; the `symbol` is what the
/// linker resolves. Symbols are validated at construction time so they
/// cannot inject arbitrary assembler directives.
#[derive(Debug, Clone)]
pub struct ExternalFunction {
    pub name: String,
    pub symbol: String,
    pub signature: FunctionType,
}

impl ExternalFunction {
    /// Valid symbols contain only alphanumerics, `_`, `.` and `$`.
    fn validate_symbol(symbol: &str) -> Result<(), String> {
        if symbol.is_empty() {
            return Err("link symbol cannot be empty".to_string());
        }
        for c in symbol.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '$') {
                return Err(format!(
                    "invalid character '{}' in link symbol '{}'; \
                     symbols may only contain alphanumerics, '_', '.' and '$'",
                    c, symbol
                ));
            }
        }
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the symbol contains characters that are not valid in
    /// an assembler symbol. Use [`CompilerConfig::from_toml`] for
    /// untrusted input.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        signature: FunctionType,
    ) -> Self {
        let symbol = symbol.into();
        Self::validate_symbol(&symbol).expect("invalid link symbol");
        ExternalFunction {
            name: name.into(),
            symbol,
            signature,
        }
    }
}

/// Configuration for one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// External runtime functions callable from Norn code
    pub external_functions: Vec<ExternalFunction>,

    /// Additional `-L` search paths for the link step
    pub library_paths: Vec<String>,

    /// Additional `-l` libraries for the link step
    pub libraries: Vec<String>,

    /// C compiler driver used to assemble and link (default `cc`)
    pub cc: Option<String>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Add an external runtime function (builder pattern).
    pub fn with_external(mut self, function: ExternalFunction) -> Self {
        self.external_functions.push(function);
        self
    }

    pub fn with_library_path(mut self, path: impl Into<String>) -> Self {
        self.library_paths.push(path.into());
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    /// Parse a TOML config file.
    pub fn from_toml(text: &str) -> Result<CompilerConfig, String> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| format!("invalid config file: {}", e))?;
        let mut config = CompilerConfig {
            external_functions: Vec::with_capacity(raw.externs.len()),
            library_paths: raw.library_paths,
            libraries: raw.libraries,
            cc: raw.cc,
        };
        for raw_extern in raw.externs {
            ExternalFunction::validate_symbol(&raw_extern.symbol)
                .map_err(|e| format!("extern '{}': {}", raw_extern.name, e))?;
            let params = raw_extern
                .params
                .iter()
                .map(|p| parse_type(p, &raw_extern.name))
                .collect::<Result<Vec<_>, _>>()?;
            let result = parse_type(&raw_extern.result, &raw_extern.name)?;
            config.external_functions.push(ExternalFunction {
                name: raw_extern.name,
                symbol: raw_extern.symbol,
                signature: FunctionType { params, result },
            });
        }
        Ok(config)
    }

    /// Name -> signature pairs for the type checker.
    pub fn external_signatures(&self) -> impl Iterator<Item = (&str, &FunctionType)> {
        self.external_functions
            .iter()
            .map(|f| (f.name.as_str(), &f.signature))
    }

    /// Name -> link symbol map for the assembly generator.
    pub fn external_symbol_map(&self) -> HashMap<String, String> {
        self.external_functions
            .iter()
            .map(|f| (f.name.clone(), f.symbol.clone()))
            .collect()
    }
}

fn parse_type(name: &str, context: &str) -> Result<Type, String> {
    Type::from_name(name)
        .ok_or_else(|| format!("extern '{}': unknown type '{}'", context, name))
}

#[derive(Deserialize)]
struct RawConfig {
    cc: Option<String>,
    #[serde(default)]
    library_paths: Vec<String>,
    #[serde(default)]
    libraries: Vec<String>,
    #[serde(default, rename = "extern")]
    externs: Vec<RawExtern>,
}

#[derive(Deserialize)]
struct RawExtern {
    name: String,
    symbol: String,
    #[serde(default)]
    params: Vec<String>,
    result: String,
}

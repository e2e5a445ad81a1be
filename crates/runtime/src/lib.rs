//! Norn runtime support library
//!
//! A small static library linked into every compiled Norn program. It
//! provides the builtin I/O operations with a plain C ABI so the
//! generated assembly can `call` them directly:
//!
//! - `print_int(i64)`: decimal value and a newline on stdout
//! - `print_bool(i64)`: `true`/`false` (nonzero/zero) and a newline
//! - `read_int() -> i64`: one whitespace-delimited decimal integer
//!   from stdin
//!
//! Booleans cross the ABI as `i64` (0 false / 1 true), matching the
//! compiler's uniform 8-byte value representation.
//!
//! A malformed or missing integer on stdin is a runtime error: the
//! program prints a diagnostic to stderr and exits with status 1.

use std::io::{self, BufRead, Write};
use std::process;

#[unsafe(no_mangle)]
pub extern "C" fn print_int(value: i64) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", value);
}

#[unsafe(no_mangle)]
pub extern "C" fn print_bool(value: i64) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", if value != 0 { "true" } else { "false" });
}

#[unsafe(no_mangle)]
pub extern "C" fn read_int() -> i64 {
    let stdin = io::stdin();
    match scan_int(&mut stdin.lock()) {
        Ok(value) => value,
        Err(message) => {
            eprintln!("read_int: {}", message);
            process::exit(1);
        }
    }
}

/// Scan one integer token: ASCII whitespace, an optional sign, then
/// decimal digits. Consumes exactly the characters it accepts, so
/// consecutive calls read consecutive tokens.
fn scan_int<R: BufRead>(input: &mut R) -> Result<i64, String> {
    loop {
        match peek_byte(input)? {
            Some(b) if b.is_ascii_whitespace() => input.consume(1),
            Some(_) => break,
            None => return Err("unexpected end of input".to_string()),
        }
    }

    let negative = match peek_byte(input)? {
        Some(b'-') => {
            input.consume(1);
            true
        }
        Some(b'+') => {
            input.consume(1);
            false
        }
        _ => false,
    };

    // Accumulate negatively so i64::MIN parses without overflow.
    let mut value: i64 = 0;
    let mut digits = 0usize;
    while let Some(b @ b'0'..=b'9') = peek_byte(input)? {
        input.consume(1);
        let digit = (b - b'0') as i64;
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_sub(digit))
            .ok_or_else(|| "integer out of range".to_string())?;
        digits += 1;
    }
    if digits == 0 {
        return Err("expected a decimal integer".to_string());
    }
    if negative {
        Ok(value)
    } else {
        value
            .checked_neg()
            .ok_or_else(|| "integer out of range".to_string())
    }
}

fn peek_byte<R: BufRead>(input: &mut R) -> Result<Option<u8>, String> {
    input
        .fill_buf()
        .map(|buffer| buffer.first().copied())
        .map_err(|e| format!("I/O error reading stdin: {}", e))
}

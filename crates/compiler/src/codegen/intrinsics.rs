//! Intrinsic operator sequences
//!
//! The IR lowers operators to calls with canonical names; everything in
//! this table is expanded inline instead of becoming a real `call`.
//! Operands arrive as `%rbp`-relative slots and results always pass
//! through `%rax` back into the destination slot.

use super::CodeGenError;
use std::fmt::Write as _;

/// Is this callee expanded inline rather than called?
pub(super) fn is_intrinsic(callee: &str) -> bool {
    matches!(
        callee,
        "+" | "-"
            | "*"
            | "/"
            | "%"
            | "<"
            | "<="
            | ">"
            | ">="
            | "eq_i64"
            | "ne_i64"
            | "eq_bool"
            | "ne_bool"
            | "unary_-"
            | "not"
    )
}

/// Emit the instruction sequence for one intrinsic.
pub(super) fn emit(
    out: &mut String,
    callee: &str,
    args: &[String],
    dest: &str,
) -> Result<(), CodeGenError> {
    match callee {
        "+" => binary(out, args, dest, "addq"),
        "-" => binary(out, args, dest, "subq"),
        "*" => binary(out, args, dest, "imulq"),
        "/" => division(out, args, dest, "%rax"),
        "%" => division(out, args, dest, "%rdx"),
        "<" => comparison(out, args, dest, "setl"),
        "<=" => comparison(out, args, dest, "setle"),
        ">" => comparison(out, args, dest, "setg"),
        ">=" => comparison(out, args, dest, "setge"),
        "eq_i64" | "eq_bool" => comparison(out, args, dest, "sete"),
        "ne_i64" | "ne_bool" => comparison(out, args, dest, "setne"),
        "unary_-" => {
            let [operand] = expect_args::<1>(callee, args)?;
            writeln!(out, "    movq {}, %rax", operand)?;
            writeln!(out, "    negq %rax")?;
            writeln!(out, "    movq %rax, {}", dest)?;
            Ok(())
        }
        "not" => {
            let [operand] = expect_args::<1>(callee, args)?;
            writeln!(out, "    movq {}, %rax", operand)?;
            writeln!(out, "    xorq $1, %rax")?;
            writeln!(out, "    movq %rax, {}", dest)?;
            Ok(())
        }
        _ => Err(CodeGenError::Logic(format!(
            "'{}' is not an intrinsic",
            callee
        ))),
    }
}

fn expect_args<'a, const N: usize>(
    callee: &str,
    args: &'a [String],
) -> Result<[&'a String; N], CodeGenError> {
    if args.len() != N {
        return Err(CodeGenError::Logic(format!(
            "intrinsic '{}' expects {} operand(s), got {}",
            callee,
            N,
            args.len()
        )));
    }
    let mut refs = args.iter();
    Ok(std::array::from_fn(|_| refs.next().expect("length checked")))
}

fn binary(
    out: &mut String,
    args: &[String],
    dest: &str,
    mnemonic: &str,
) -> Result<(), CodeGenError> {
    let [left, right] = expect_args::<2>(mnemonic, args)?;
    writeln!(out, "    movq {}, %rax", left)?;
    writeln!(out, "    movq {}, %rdx", right)?;
    writeln!(out, "    {} %rdx, %rax", mnemonic)?;
    writeln!(out, "    movq %rax, {}", dest)?;
    Ok(())
}

/// `idivq` divides `%rdx:%rax`; `cqto` sign-extends the dividend and
/// the quotient/remainder land in `%rax`/`%rdx`.
fn division(
    out: &mut String,
    args: &[String],
    dest: &str,
    result_register: &str,
) -> Result<(), CodeGenError> {
    let [dividend, divisor] = expect_args::<2>("idivq", args)?;
    writeln!(out, "    movq {}, %rax", dividend)?;
    writeln!(out, "    movq {}, %rcx", divisor)?;
    writeln!(out, "    cqto")?;
    writeln!(out, "    idivq %rcx")?;
    writeln!(out, "    movq {}, {}", result_register, dest)?;
    Ok(())
}

fn comparison(
    out: &mut String,
    args: &[String],
    dest: &str,
    set_instruction: &str,
) -> Result<(), CodeGenError> {
    let [left, right] = expect_args::<2>(set_instruction, args)?;
    writeln!(out, "    movq {}, %rax", left)?;
    writeln!(out, "    movq {}, %rdx", right)?;
    writeln!(out, "    cmpq %rdx, %rax")?;
    writeln!(out, "    {} %al", set_instruction)?;
    writeln!(out, "    movzbq %al, %rax")?;
    writeln!(out, "    movq %rax, {}", dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(callee: &str, args: &[&str]) -> String {
        let mut out = String::new();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        emit(&mut out, callee, &args, "-8(%rbp)").unwrap();
        out
    }

    #[test]
    fn test_operator_names_are_intrinsic() {
        for name in [
            "+", "-", "*", "/", "%", "<", "<=", ">", ">=", "eq_i64", "ne_bool", "unary_-", "not",
        ] {
            assert!(is_intrinsic(name), "{} should be intrinsic", name);
        }
        assert!(!is_intrinsic("print_int"));
        assert!(!is_intrinsic("sq"));
    }

    #[test]
    fn test_addition_sequence() {
        let asm = expand("+", &["-16(%rbp)", "-24(%rbp)"]);
        assert!(asm.contains("movq -16(%rbp), %rax"));
        assert!(asm.contains("movq -24(%rbp), %rdx"));
        assert!(asm.contains("addq %rdx, %rax"));
        assert!(asm.contains("movq %rax, -8(%rbp)"));
    }

    #[test]
    fn test_division_and_remainder() {
        let asm = expand("/", &["-16(%rbp)", "-24(%rbp)"]);
        assert!(asm.contains("cqto"));
        assert!(asm.contains("idivq %rcx"));
        assert!(asm.contains("movq %rax, -8(%rbp)"));

        let asm = expand("%", &["-16(%rbp)", "-24(%rbp)"]);
        assert!(asm.contains("movq %rdx, -8(%rbp)"));
    }

    #[test]
    fn test_comparison_uses_setcc() {
        let asm = expand("<", &["-16(%rbp)", "-24(%rbp)"]);
        assert!(asm.contains("cmpq %rdx, %rax"));
        assert!(asm.contains("setl %al"));
        assert!(asm.contains("movzbq %al, %rax"));

        assert!(expand("eq_bool", &["-16(%rbp)", "-24(%rbp)"]).contains("sete %al"));
        assert!(expand("ne_i64", &["-16(%rbp)", "-24(%rbp)"]).contains("setne %al"));
    }

    #[test]
    fn test_unary_sequences() {
        assert!(expand("unary_-", &["-16(%rbp)"]).contains("negq %rax"));
        assert!(expand("not", &["-16(%rbp)"]).contains("xorq $1, %rax"));
    }

    #[test]
    fn test_wrong_arity_is_a_logic_error() {
        let mut out = String::new();
        let err = emit(&mut out, "+", &["-8(%rbp)".to_string()], "-16(%rbp)").unwrap_err();
        assert!(err.to_string().contains("expects 2 operand(s)"));
    }
}

//! Builtin signatures for Norn
//!
//! Defines the callable I/O builtins provided by the runtime library
//! and the operator signature table the type checker resolves against.

use crate::ast::{BinaryOp, UnaryOp};
use crate::types::{FunctionType, Type};

/// Runtime symbols every compiled program may reference. These are
/// declared `.extern` in the emitted assembly and resolved from
/// `libnorn_runtime.a` at link time.
pub const RUNTIME_SYMBOLS: &[&str] = &["print_int", "print_bool", "read_int"];

/// Signatures of the callable builtins, used to seed the type checker's
/// root scope.
pub fn builtin_functions() -> Vec<(&'static str, FunctionType)> {
    vec![
        (
            "print_int",
            FunctionType {
                params: vec![Type::Int],
                result: Type::Unit,
            },
        ),
        (
            "print_bool",
            FunctionType {
                params: vec![Type::Bool],
                result: Type::Unit,
            },
        ),
        (
            "read_int",
            FunctionType {
                params: vec![],
                result: Type::Int,
            },
        ),
    ]
}

/// Signature of a prefix operator.
pub fn unary_signature(op: UnaryOp) -> FunctionType {
    match op {
        UnaryOp::Neg => FunctionType {
            params: vec![Type::Int],
            result: Type::Int,
        },
        UnaryOp::Not => FunctionType {
            params: vec![Type::Bool],
            result: Type::Bool,
        },
    }
}

/// Signature of an infix operator given the left operand's type.
///
/// Most operators are monomorphic; `==`/`!=` are overloaded over Int
/// and Bool, with both operands required to have the same type. Returns
/// `None` when the left operand type rules the operator out entirely.
pub fn binary_signature(op: BinaryOp, left: &Type) -> Option<FunctionType> {
    use BinaryOp::*;
    match op {
        Add | Sub | Mul | Div | Rem => Some(FunctionType {
            params: vec![Type::Int, Type::Int],
            result: Type::Int,
        }),
        Lt | Le | Gt | Ge => Some(FunctionType {
            params: vec![Type::Int, Type::Int],
            result: Type::Bool,
        }),
        And | Or => Some(FunctionType {
            params: vec![Type::Bool, Type::Bool],
            result: Type::Bool,
        }),
        Eq | Ne => match left {
            Type::Int | Type::Bool => Some(FunctionType {
                params: vec![left.clone(), left.clone()],
                result: Type::Bool,
            }),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_signatures() {
        let builtins = builtin_functions();
        let print_int = &builtins.iter().find(|(n, _)| *n == "print_int").unwrap().1;
        assert_eq!(print_int.params, vec![Type::Int]);
        assert_eq!(print_int.result, Type::Unit);
        let read_int = &builtins.iter().find(|(n, _)| *n == "read_int").unwrap().1;
        assert!(read_int.params.is_empty());
        assert_eq!(read_int.result, Type::Int);
    }

    #[test]
    fn test_equality_is_overloaded() {
        let on_int = binary_signature(BinaryOp::Eq, &Type::Int).unwrap();
        assert_eq!(on_int.params, vec![Type::Int, Type::Int]);
        assert_eq!(on_int.result, Type::Bool);

        let on_bool = binary_signature(BinaryOp::Ne, &Type::Bool).unwrap();
        assert_eq!(on_bool.params, vec![Type::Bool, Type::Bool]);

        assert!(binary_signature(BinaryOp::Eq, &Type::Unit).is_none());
    }

    #[test]
    fn test_comparison_takes_ints_to_bool() {
        let sig = binary_signature(BinaryOp::Lt, &Type::Int).unwrap();
        assert_eq!(sig.params, vec![Type::Int, Type::Int]);
        assert_eq!(sig.result, Type::Bool);
    }
}

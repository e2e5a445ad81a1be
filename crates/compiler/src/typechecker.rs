//! Type checker for Norn
//!
//! A single top-down pass over the untyped AST that rebuilds it with a
//! concrete [`Type`] on every node. Carries a lexical scope stack, the
//! enclosing function's declared return type, and a stack of loop
//! frames that accumulate the type carried by `break`.
//!
//! All diagnostics are fatal: checking stops at the first failure.

use crate::ast::{ExprKind, Expression, FunDef, Module, SourceLocation, TypedExpr};
use crate::builtins::{binary_signature, builtin_functions, unary_signature};
use crate::symbol_table::SymbolTable;
use crate::types::{FunctionType, Type};

/// Tracks the value type carried by `break` inside one loop. `None`
/// until the first `break` fixes it.
struct LoopFrame {
    break_type: Option<Type>,
}

pub struct TypeChecker {
    symtab: SymbolTable<Type>,
    /// Declared return type of the function being checked, if any.
    return_type: Option<Type>,
    loops: Vec<LoopFrame>,
}

impl TypeChecker {
    /// A checker whose root scope holds the builtin signatures.
    pub fn new() -> Self {
        let mut symtab = SymbolTable::new();
        for (name, signature) in builtin_functions() {
            symtab
                .declare(name, Type::Function(Box::new(signature)))
                .expect("builtin names are distinct");
        }
        TypeChecker {
            symtab,
            return_type: None,
            loops: Vec::new(),
        }
    }

    /// Register additional callable signatures (external runtime
    /// functions from the compiler configuration). Names collide with
    /// builtins and each other like any other root-scope declaration.
    pub fn register_external_functions<'a>(
        &mut self,
        functions: impl IntoIterator<Item = (&'a str, &'a FunctionType)>,
    ) -> Result<(), String> {
        for (name, signature) in functions {
            self.symtab
                .declare(name, Type::Function(Box::new(signature.clone())))
                .map_err(|e| format!("external function {}", e))?;
        }
        Ok(())
    }

    /// Check a whole module, producing its typed counterpart.
    ///
    /// Function signatures are declared up front so bodies can call any
    /// function in the module regardless of definition order.
    pub fn check_module(&mut self, module: Module<()>) -> Result<Module<Type>, String> {
        for f in &module.functions {
            if f.name == "main" {
                return Err(format!(
                    "{}: function name 'main' is reserved for the program entry point",
                    f.loc
                ));
            }
            let signature = FunctionType {
                params: f.params.iter().map(|p| p.ty.clone()).collect(),
                result: f.return_type.clone(),
            };
            self.symtab
                .declare(&f.name, Type::Function(Box::new(signature)))
                .map_err(|e| format!("{}: function {}", f.loc, e))?;
        }

        let functions = module
            .functions
            .into_iter()
            .map(|f| self.check_function(f))
            .collect::<Result<Vec<_>, String>>()?;

        let top_level = match module.top_level {
            Some(expr) => Some(self.check_expr(expr)?),
            None => None,
        };

        Ok(Module {
            functions,
            top_level,
        })
    }

    fn check_function(&mut self, f: FunDef<()>) -> Result<FunDef<Type>, String> {
        self.symtab.enter_scope();
        for p in &f.params {
            self.symtab
                .declare(&p.name, p.ty.clone())
                .map_err(|e| format!("{}: parameter {}", p.loc, e))?;
        }
        self.return_type = Some(f.return_type.clone());
        let body = self.check_expr(f.body)?;
        self.return_type = None;
        self.symtab.exit_scope();

        // The trailing expression must produce the declared type unless
        // every path through the body already hit an explicit return.
        if body.ty != f.return_type && !always_returns(&body) {
            return Err(format!(
                "{}: body of function '{}' has type {}, but the declared return type is {}",
                f.loc, f.name, body.ty, f.return_type
            ));
        }
        Ok(FunDef {
            name: f.name,
            params: f.params,
            return_type: f.return_type,
            body,
            loc: f.loc,
        })
    }

    fn check_expr(&mut self, expr: Expression<()>) -> Result<TypedExpr, String> {
        let loc = expr.loc;
        match expr.kind {
            ExprKind::IntLit(value) => Ok(typed(loc, Type::Int, ExprKind::IntLit(value))),
            ExprKind::BoolLit(value) => Ok(typed(loc, Type::Bool, ExprKind::BoolLit(value))),

            ExprKind::Ident(name) => {
                let ty = self
                    .symtab
                    .lookup(&name)
                    .cloned()
                    .ok_or_else(|| format!("{}: unbound identifier '{}'", loc, name))?;
                // Functions are not first-class values; they only
                // appear as callees.
                if matches!(ty, Type::Function(_)) {
                    return Err(format!(
                        "{}: function '{}' is not a value; call it instead",
                        loc, name
                    ));
                }
                Ok(typed(loc, ty, ExprKind::Ident(name)))
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.check_expr(*operand)?;
                let signature = unary_signature(op);
                if operand.ty != signature.params[0] {
                    return Err(format!(
                        "{}: operator '{}' expects {}, got {}",
                        loc, op, signature.params[0], operand.ty
                    ));
                }
                Ok(typed(
                    loc,
                    signature.result,
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                ))
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(*left)?;
                let right = self.check_expr(*right)?;
                let signature = binary_signature(op, &left.ty).ok_or_else(|| {
                    format!(
                        "{}: operator '{}' is not defined for operands of type {}",
                        loc, op, left.ty
                    )
                })?;
                if left.ty != signature.params[0] || right.ty != signature.params[1] {
                    return Err(format!(
                        "{}: operator '{}' expects ({}, {}), got ({}, {})",
                        loc,
                        op,
                        signature.params[0],
                        signature.params[1],
                        left.ty,
                        right.ty
                    ));
                }
                Ok(typed(
                    loc,
                    signature.result,
                    ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                ))
            }

            ExprKind::Assign { target, value } => {
                let ExprKind::Ident(name) = &target.kind else {
                    return Err(format!(
                        "{}: left-hand side of assignment must be a variable",
                        target.loc
                    ));
                };
                let target_ty = self
                    .symtab
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| format!("{}: unbound identifier '{}'", target.loc, name))?;
                if matches!(target_ty, Type::Function(_)) {
                    return Err(format!("{}: cannot assign to function '{}'", loc, name));
                }
                let value = self.check_expr(*value)?;
                if value.ty != target_ty {
                    return Err(format!(
                        "{}: cannot assign a value of type {} to '{}' of type {}",
                        loc, value.ty, name, target_ty
                    ));
                }
                let target = typed(target.loc, target_ty.clone(), ExprKind::Ident(name.clone()));
                Ok(typed(
                    loc,
                    target_ty,
                    ExprKind::Assign {
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                ))
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.check_expr(*condition)?;
                if condition.ty != Type::Bool {
                    return Err(format!(
                        "{}: if condition must be Bool, got {}",
                        condition.loc, condition.ty
                    ));
                }
                let then_branch = self.check_expr(*then_branch)?;
                match else_branch {
                    Some(else_branch) => {
                        let else_branch = self.check_expr(*else_branch)?;
                        if then_branch.ty != else_branch.ty {
                            return Err(format!(
                                "{}: if branches have mismatched types {} and {}",
                                loc, then_branch.ty, else_branch.ty
                            ));
                        }
                        let ty = then_branch.ty.clone();
                        Ok(typed(
                            loc,
                            ty,
                            ExprKind::If {
                                condition: Box::new(condition),
                                then_branch: Box::new(then_branch),
                                else_branch: Some(Box::new(else_branch)),
                            },
                        ))
                    }
                    None => {
                        if then_branch.ty != Type::Unit {
                            return Err(format!(
                                "{}: if without else must have a Unit branch, got {}",
                                loc, then_branch.ty
                            ));
                        }
                        Ok(typed(
                            loc,
                            Type::Unit,
                            ExprKind::If {
                                condition: Box::new(condition),
                                then_branch: Box::new(then_branch),
                                else_branch: None,
                            },
                        ))
                    }
                }
            }

            ExprKind::While { condition, body } => {
                // The loop frame goes on before the condition is
                // checked, so a break in the condition belongs to this
                // loop.
                self.loops.push(LoopFrame { break_type: None });
                let checked: Result<(TypedExpr, TypedExpr), String> = (|| {
                    let condition = self.check_expr(*condition)?;
                    if condition.ty != Type::Bool {
                        return Err(format!(
                            "{}: while condition must be Bool, got {}",
                            condition.loc, condition.ty
                        ));
                    }
                    let body = self.check_expr(*body)?;
                    Ok((condition, body))
                })();
                self.loops.pop();
                let (condition, body) = checked?;
                if body.ty != Type::Unit {
                    return Err(format!(
                        "{}: while body must have type Unit, got {}",
                        loc, body.ty
                    ));
                }
                Ok(typed(
                    loc,
                    Type::Unit,
                    ExprKind::While {
                        condition: Box::new(condition),
                        body: Box::new(body),
                    },
                ))
            }

            ExprKind::Break { value } => {
                let value = match value {
                    Some(v) => Some(Box::new(self.check_expr(*v)?)),
                    None => None,
                };
                let carried = value.as_ref().map_or(Type::Unit, |v| v.ty.clone());
                let frame = self
                    .loops
                    .last_mut()
                    .ok_or_else(|| format!("{}: break outside of a loop", loc))?;
                match &frame.break_type {
                    None => frame.break_type = Some(carried),
                    Some(existing) if *existing == carried => {}
                    Some(existing) => {
                        return Err(format!(
                            "{}: break carries a value of type {}, but an earlier break in this loop fixed it to {}",
                            loc, carried, existing
                        ));
                    }
                }
                Ok(typed(loc, Type::Unit, ExprKind::Break { value }))
            }

            ExprKind::Continue => {
                if self.loops.is_empty() {
                    return Err(format!("{}: continue outside of a loop", loc));
                }
                Ok(typed(loc, Type::Unit, ExprKind::Continue))
            }

            ExprKind::VarDecl {
                name,
                annotation,
                initializer,
            } => {
                let initializer = self.check_expr(*initializer)?;
                if let Some(declared) = &annotation
                    && *declared != initializer.ty
                {
                    return Err(format!(
                        "{}: variable '{}' is declared as {}, but its initializer has type {}",
                        loc, name, declared, initializer.ty
                    ));
                }
                self.symtab
                    .declare(&name, initializer.ty.clone())
                    .map_err(|e| format!("{}: {}", loc, e))?;
                Ok(typed(
                    loc,
                    Type::Unit,
                    ExprKind::VarDecl {
                        name,
                        annotation,
                        initializer: Box::new(initializer),
                    },
                ))
            }

            ExprKind::Block { statements, result } => {
                self.symtab.enter_scope();
                let checked: Result<(Vec<TypedExpr>, Option<TypedExpr>), String> = (|| {
                    let statements = statements
                        .into_iter()
                        .map(|s| self.check_expr(s))
                        .collect::<Result<Vec<_>, _>>()?;
                    let result = match result {
                        Some(r) => Some(self.check_expr(*r)?),
                        None => None,
                    };
                    Ok((statements, result))
                })();
                self.symtab.exit_scope();
                let (statements, result) = checked?;
                let ty = result.as_ref().map_or(Type::Unit, |r| r.ty.clone());
                Ok(typed(
                    loc,
                    ty,
                    ExprKind::Block {
                        statements,
                        result: result.map(Box::new),
                    },
                ))
            }

            ExprKind::Call { callee, args } => {
                let callee_ty = self
                    .symtab
                    .lookup(&callee)
                    .cloned()
                    .ok_or_else(|| format!("{}: unbound identifier '{}'", loc, callee))?;
                let signature = match callee_ty {
                    Type::Function(signature) => signature,
                    other => {
                        return Err(format!(
                            "{}: '{}' has type {} and is not callable",
                            loc, callee, other
                        ));
                    }
                };
                if args.len() != signature.params.len() {
                    return Err(format!(
                        "{}: '{}' expects {} argument(s), got {}",
                        loc,
                        callee,
                        signature.params.len(),
                        args.len()
                    ));
                }
                let args = args
                    .into_iter()
                    .zip(&signature.params)
                    .enumerate()
                    .map(|(i, (arg, expected))| {
                        let arg = self.check_expr(arg)?;
                        if arg.ty != *expected {
                            return Err(format!(
                                "{}: argument {} of '{}' must be {}, got {}",
                                arg.loc,
                                i + 1,
                                callee,
                                expected,
                                arg.ty
                            ));
                        }
                        Ok(arg)
                    })
                    .collect::<Result<Vec<_>, String>>()?;
                Ok(typed(loc, signature.result, ExprKind::Call { callee, args }))
            }

            ExprKind::Return { value } => {
                let declared = self
                    .return_type
                    .clone()
                    .ok_or_else(|| format!("{}: return outside of a function", loc))?;
                let value = match value {
                    Some(v) => Some(Box::new(self.check_expr(*v)?)),
                    None => None,
                };
                let returned = value.as_ref().map_or(Type::Unit, |v| v.ty.clone());
                if returned != declared {
                    return Err(format!(
                        "{}: return value has type {}, but the function returns {}",
                        loc, returned, declared
                    ));
                }
                Ok(typed(loc, Type::Unit, ExprKind::Return { value }))
            }
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn typed(loc: SourceLocation, ty: Type, kind: ExprKind<Type>) -> TypedExpr {
    Expression { loc, ty, kind }
}

/// Does every path through this expression end in an explicit
/// `return`? Conservative: only returns, blocks reaching one, and
/// two-armed ifs whose arms both return count.
fn always_returns(expr: &TypedExpr) -> bool {
    match &expr.kind {
        ExprKind::Return { .. } => true,
        ExprKind::Block { statements, result } => {
            statements.iter().any(always_returns)
                || result.as_ref().is_some_and(|r| always_returns(r))
        }
        ExprKind::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => always_returns(then_branch) && always_returns(else_branch),
        _ => false,
    }
}

//! IR generation
//!
//! Lowers the typed AST to the flat three-address form. Each function
//! gets its own variable/label counters and a dedicated `unit`
//! variable; expressions that produce no interesting value still yield
//! a destination variable to keep the lowering uniform.
//!
//! Control flow is threaded through explicit context: a scope stack
//! maps source names to IR variables, and a LIFO of loop frames carries
//! the labels `break` and `continue` jump to. `and`/`or` lower to
//! conditional jumps, not calls, preserving short-circuit evaluation.
//!
//! Type checking has already accepted the module, so any violation
//! found here is an internal compiler error.

use crate::ast::{BinaryOp, ExprKind, FunDef, Module, TypedExpr};
use crate::ir::{Instruction, IrFunction, IrVar, Label};
use crate::symbol_table::SymbolTable;
use crate::types::Type;
use std::collections::HashMap;

/// Labels a `break`/`continue` inside the loop body jumps to, plus the
/// lazily allocated variable that receives `break` values.
struct LoopFrame {
    start: Label,
    end: Label,
    result: Option<IrVar>,
}

/// Lower a type-checked module. Returns the user functions in source
/// order followed by the synthesized `main`.
pub fn generate_ir(module: &Module<Type>) -> Result<Vec<IrFunction>, String> {
    let mut functions = Vec::with_capacity(module.functions.len() + 1);
    for f in &module.functions {
        functions.push(lower_function(f)?);
    }
    functions.push(lower_main(module.top_level.as_ref())?);
    Ok(functions)
}

fn lower_function(f: &FunDef<Type>) -> Result<IrFunction, String> {
    let mut builder = FunctionBuilder::new(&f.name);
    let mut symtab = SymbolTable::new();
    let mut params = Vec::with_capacity(f.params.len());
    for p in &f.params {
        let var = builder.new_var(p.ty.clone());
        symtab
            .declare(&p.name, var.clone())
            .map_err(|e| internal(&f.name, &e))?;
        params.push(var);
    }

    let result = builder.lower(&mut symtab, &f.body)?;
    if !builder.ends_with_return() {
        let value = match f.return_type {
            Type::Unit => None,
            _ => Some(result),
        };
        builder.emit(Instruction::Return { value });
    }
    Ok(builder.finish(params))
}

/// `main` evaluates the module's top-level expression and returns 0.
fn lower_main(top_level: Option<&TypedExpr>) -> Result<IrFunction, String> {
    let mut builder = FunctionBuilder::new("main");
    let mut symtab = SymbolTable::new();
    if let Some(expr) = top_level {
        builder.lower(&mut symtab, expr)?;
    }
    let status = builder.new_var(Type::Int);
    builder.emit(Instruction::LoadIntConst {
        value: 0,
        dest: status.clone(),
    });
    builder.emit(Instruction::Return {
        value: Some(status),
    });
    Ok(builder.finish(Vec::new()))
}

fn internal(function: &str, message: &str) -> String {
    format!(
        "internal compiler error in IR generation of '{}': {}",
        function, message
    )
}

struct FunctionBuilder {
    name: String,
    instructions: Vec<Instruction>,
    var_types: HashMap<IrVar, Type>,
    var_counter: usize,
    label_counter: usize,
    unit: IrVar,
    loops: Vec<LoopFrame>,
}

impl FunctionBuilder {
    fn new(name: &str) -> Self {
        let unit = IrVar::new("unit");
        let mut var_types = HashMap::new();
        var_types.insert(unit.clone(), Type::Unit);
        FunctionBuilder {
            name: name.to_string(),
            instructions: Vec::new(),
            var_types,
            var_counter: 0,
            label_counter: 0,
            unit,
            loops: Vec::new(),
        }
    }

    fn new_var(&mut self, ty: Type) -> IrVar {
        let var = IrVar::new(format!("v{}", self.var_counter));
        self.var_counter += 1;
        self.var_types.insert(var.clone(), ty);
        var
    }

    fn new_label(&mut self, stem: &str) -> Label {
        let label = Label::new(format!("{}{}", stem, self.label_counter));
        self.label_counter += 1;
        label
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn emit_label(&mut self, name: Label) {
        self.emit(Instruction::Label { name });
    }

    fn ends_with_return(&self) -> bool {
        matches!(self.instructions.last(), Some(Instruction::Return { .. }))
    }

    fn finish(self, params: Vec<IrVar>) -> IrFunction {
        IrFunction {
            name: self.name,
            params,
            var_types: self.var_types,
            instructions: self.instructions,
        }
    }

    /// Lower one expression, returning the variable holding its value.
    fn lower(
        &mut self,
        symtab: &mut SymbolTable<IrVar>,
        expr: &TypedExpr,
    ) -> Result<IrVar, String> {
        match &expr.kind {
            ExprKind::IntLit(value) => {
                let dest = self.new_var(Type::Int);
                self.emit(Instruction::LoadIntConst {
                    value: *value,
                    dest: dest.clone(),
                });
                Ok(dest)
            }

            ExprKind::BoolLit(value) => {
                let dest = self.new_var(Type::Bool);
                self.emit(Instruction::LoadBoolConst {
                    value: *value,
                    dest: dest.clone(),
                });
                Ok(dest)
            }

            ExprKind::Ident(name) => symtab
                .lookup(name)
                .cloned()
                .ok_or_else(|| internal(&self.name, &format!("unbound identifier '{}'", name))),

            ExprKind::Unary { op, operand } => {
                let arg = self.lower(symtab, operand)?;
                let dest = self.new_var(expr.ty.clone());
                self.emit(Instruction::Call {
                    callee: op.ir_name().to_string(),
                    args: vec![arg],
                    dest: dest.clone(),
                });
                Ok(dest)
            }

            ExprKind::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => self.lower_short_circuit(symtab, *op, left, right),
                BinaryOp::Eq | BinaryOp::Ne => {
                    let callee = equality_callee(*op, &left.ty);
                    self.lower_operator_call(symtab, callee, left, right, &expr.ty)
                }
                _ => self.lower_operator_call(symtab, op.symbol(), left, right, &expr.ty),
            },

            ExprKind::Assign { target, value } => {
                let ExprKind::Ident(name) = &target.kind else {
                    return Err(internal(&self.name, "assignment to a non-variable"));
                };
                let source = self.lower(symtab, value)?;
                let dest = symtab
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| internal(&self.name, &format!("unbound identifier '{}'", name)))?;
                self.emit(Instruction::Copy {
                    source,
                    dest: dest.clone(),
                });
                Ok(dest)
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(symtab, condition, then_branch, else_branch.as_deref(), &expr.ty),

            ExprKind::While { condition, body } => self.lower_while(symtab, condition, body),

            ExprKind::Break { value } => {
                if self.loops.is_empty() {
                    return Err(internal(&self.name, "break outside of a loop"));
                }
                let frame = self.loops.len() - 1;
                if let Some(v) = value {
                    let source = self.lower(symtab, v)?;
                    if v.ty != Type::Unit {
                        // The loop's result variable is allocated at
                        // the first break that carries a value.
                        let dest = match self.loops[frame].result.clone() {
                            Some(existing) => existing,
                            None => {
                                let fresh = self.new_var(v.ty.clone());
                                self.loops[frame].result = Some(fresh.clone());
                                fresh
                            }
                        };
                        self.emit(Instruction::Copy { source, dest });
                    }
                }
                let target = self.loops[frame].end.clone();
                self.emit(Instruction::Jump { target });
                Ok(self.unit.clone())
            }

            ExprKind::Continue => {
                let frame = self
                    .loops
                    .last()
                    .ok_or_else(|| internal(&self.name, "continue outside of a loop"))?;
                let target = frame.start.clone();
                self.emit(Instruction::Jump { target });
                Ok(self.unit.clone())
            }

            ExprKind::VarDecl {
                name, initializer, ..
            } => {
                let source = self.lower(symtab, initializer)?;
                let dest = self.new_var(initializer.ty.clone());
                self.emit(Instruction::Copy {
                    source,
                    dest: dest.clone(),
                });
                symtab
                    .declare(name, dest)
                    .map_err(|e| internal(&self.name, &e))?;
                Ok(self.unit.clone())
            }

            ExprKind::Block { statements, result } => {
                symtab.enter_scope();
                let mut value = Ok(self.unit.clone());
                for statement in statements {
                    if let Err(e) = self.lower(symtab, statement) {
                        value = Err(e);
                        break;
                    }
                }
                if value.is_ok()
                    && let Some(result) = result
                {
                    value = self.lower(symtab, result);
                }
                symtab.exit_scope();
                value
            }

            ExprKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|a| self.lower(symtab, a))
                    .collect::<Result<Vec<_>, _>>()?;
                let dest = self.new_var(expr.ty.clone());
                self.emit(Instruction::Call {
                    callee: callee.clone(),
                    args,
                    dest: dest.clone(),
                });
                Ok(dest)
            }

            ExprKind::Return { value } => {
                let value = match value {
                    Some(v) => {
                        let var = self.lower(symtab, v)?;
                        if v.ty == Type::Unit { None } else { Some(var) }
                    }
                    None => None,
                };
                self.emit(Instruction::Return { value });
                Ok(self.unit.clone())
            }
        }
    }

    fn lower_operator_call(
        &mut self,
        symtab: &mut SymbolTable<IrVar>,
        callee: &str,
        left: &TypedExpr,
        right: &TypedExpr,
        result_ty: &Type,
    ) -> Result<IrVar, String> {
        let left = self.lower(symtab, left)?;
        let right = self.lower(symtab, right)?;
        let dest = self.new_var(result_ty.clone());
        self.emit(Instruction::Call {
            callee: callee.to_string(),
            args: vec![left, right],
            dest: dest.clone(),
        });
        Ok(dest)
    }

    /// `and`/`or` lower to conditional jumps so the right operand only
    /// evaluates when it can affect the result.
    fn lower_short_circuit(
        &mut self,
        symtab: &mut SymbolTable<IrVar>,
        op: BinaryOp,
        left: &TypedExpr,
        right: &TypedExpr,
    ) -> Result<IrVar, String> {
        let (stem, skip_value) = match op {
            BinaryOp::And => ("and", false),
            BinaryOp::Or => ("or", true),
            _ => unreachable!("only and/or short-circuit"),
        };
        let rhs_label = self.new_label(&format!("{}_rhs", stem));
        let skip_label = self.new_label(&format!("{}_skip", stem));
        let end_label = self.new_label(&format!("{}_end", stem));
        let dest = self.new_var(Type::Bool);

        let condition = self.lower(symtab, left)?;
        let (then_target, else_target) = if skip_value {
            // or: a true left operand decides the result
            (skip_label.clone(), rhs_label.clone())
        } else {
            // and: a false left operand decides the result
            (rhs_label.clone(), skip_label.clone())
        };
        self.emit(Instruction::CondJump {
            condition,
            then_target,
            else_target,
        });

        self.emit_label(rhs_label);
        let rhs = self.lower(symtab, right)?;
        self.emit(Instruction::Copy {
            source: rhs,
            dest: dest.clone(),
        });
        self.emit(Instruction::Jump {
            target: end_label.clone(),
        });

        self.emit_label(skip_label);
        self.emit(Instruction::LoadBoolConst {
            value: skip_value,
            dest: dest.clone(),
        });
        self.emit(Instruction::Jump {
            target: end_label.clone(),
        });

        self.emit_label(end_label);
        Ok(dest)
    }

    fn lower_if(
        &mut self,
        symtab: &mut SymbolTable<IrVar>,
        condition: &TypedExpr,
        then_branch: &TypedExpr,
        else_branch: Option<&TypedExpr>,
        result_ty: &Type,
    ) -> Result<IrVar, String> {
        let condition = self.lower(symtab, condition)?;
        let then_label = self.new_label("then");
        let end_label = self.new_label("if_end");

        match else_branch {
            None => {
                self.emit(Instruction::CondJump {
                    condition,
                    then_target: then_label.clone(),
                    else_target: end_label.clone(),
                });
                self.emit_label(then_label);
                self.lower(symtab, then_branch)?;
                self.emit_label(end_label);
                Ok(self.unit.clone())
            }
            Some(else_branch) => {
                let else_label = self.new_label("else");
                let merged = match result_ty {
                    Type::Unit => self.unit.clone(),
                    _ => self.new_var(result_ty.clone()),
                };
                self.emit(Instruction::CondJump {
                    condition,
                    then_target: then_label.clone(),
                    else_target: else_label.clone(),
                });

                self.emit_label(then_label);
                let then_value = self.lower(symtab, then_branch)?;
                if *result_ty != Type::Unit {
                    self.emit(Instruction::Copy {
                        source: then_value,
                        dest: merged.clone(),
                    });
                }
                self.emit(Instruction::Jump {
                    target: end_label.clone(),
                });

                self.emit_label(else_label);
                let else_value = self.lower(symtab, else_branch)?;
                if *result_ty != Type::Unit {
                    self.emit(Instruction::Copy {
                        source: else_value,
                        dest: merged.clone(),
                    });
                }
                self.emit(Instruction::Jump {
                    target: end_label.clone(),
                });

                self.emit_label(end_label);
                Ok(merged)
            }
        }
    }

    fn lower_while(
        &mut self,
        symtab: &mut SymbolTable<IrVar>,
        condition: &TypedExpr,
        body: &TypedExpr,
    ) -> Result<IrVar, String> {
        let start_label = self.new_label("while_start");
        let body_label = self.new_label("while_body");
        let end_label = self.new_label("while_end");

        // The frame goes on before the condition is lowered, so a
        // break in the condition jumps to this loop's end label.
        self.loops.push(LoopFrame {
            start: start_label.clone(),
            end: end_label.clone(),
            result: None,
        });
        self.emit_label(start_label.clone());
        let condition = match self.lower(symtab, condition) {
            Ok(condition) => condition,
            Err(e) => {
                self.loops.pop();
                return Err(e);
            }
        };
        self.emit(Instruction::CondJump {
            condition,
            then_target: body_label.clone(),
            else_target: end_label.clone(),
        });

        self.emit_label(body_label);
        let body_result = self.lower(symtab, body);
        self.loops.pop();
        body_result?;

        self.emit(Instruction::Jump {
            target: start_label,
        });
        self.emit_label(end_label);
        Ok(self.unit.clone())
    }
}

fn equality_callee(op: BinaryOp, operand_ty: &Type) -> &'static str {
    match (op, operand_ty) {
        (BinaryOp::Eq, Type::Bool) => "eq_bool",
        (BinaryOp::Eq, _) => "eq_i64",
        (BinaryOp::Ne, Type::Bool) => "ne_bool",
        (BinaryOp::Ne, _) => "ne_i64",
        _ => unreachable!("only ==/!= specialize"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::tokenizer::tokenize;
    use crate::typechecker::TypeChecker;

    fn lower(source: &str) -> Vec<IrFunction> {
        let module = parse(tokenize(source).expect("tokenize")).expect("parse");
        let module = TypeChecker::new().check_module(module).expect("typecheck");
        generate_ir(&module).expect("IR generation")
    }

    fn main_fn(functions: &[IrFunction]) -> &IrFunction {
        functions.iter().find(|f| f.name == "main").expect("main")
    }

    fn call_count(f: &IrFunction, callee: &str) -> usize {
        f.instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Call { callee: c, .. } if c == callee))
            .count()
    }

    #[test]
    fn test_arithmetic_lowers_to_operator_calls() {
        let functions = lower("print_int(1 + 2 * 3);");
        let main = main_fn(&functions);
        assert_eq!(call_count(main, "*"), 1);
        assert_eq!(call_count(main, "+"), 1);
        assert_eq!(call_count(main, "print_int"), 1);
        // The multiplication happens before the addition consumes it.
        let order: Vec<&str> = main
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Call { callee, .. } => Some(callee.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec!["*", "+", "print_int"]);
    }

    #[test]
    fn test_main_returns_zero() {
        let functions = lower("print_int(1);");
        let main = main_fn(&functions);
        let last_two = &main.instructions[main.instructions.len() - 2..];
        assert!(matches!(
            last_two[0],
            Instruction::LoadIntConst { value: 0, .. }
        ));
        assert!(matches!(last_two[1], Instruction::Return { value: Some(_) }));
    }

    #[test]
    fn test_empty_module_still_produces_main() {
        let functions = lower("");
        assert_eq!(functions.len(), 1);
        let main = main_fn(&functions);
        assert!(matches!(
            main.instructions.last(),
            Some(Instruction::Return { value: Some(_) })
        ));
    }

    #[test]
    fn test_equality_specializes_on_operand_type() {
        let functions = lower("print_bool(1 == 2); print_bool(true != false);");
        let main = main_fn(&functions);
        assert_eq!(call_count(main, "eq_i64"), 1);
        assert_eq!(call_count(main, "ne_bool"), 1);
    }

    #[test]
    fn test_short_circuit_emits_no_call() {
        let functions = lower("print_bool(1 == 1 and not (2 < 1));");
        let main = main_fn(&functions);
        assert_eq!(call_count(main, "and"), 0);
        let cond_jumps = main
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::CondJump { .. }))
            .count();
        assert_eq!(cond_jumps, 1);
        assert_eq!(call_count(main, "not"), 1);
    }

    #[test]
    fn test_or_skip_value_is_true() {
        let functions = lower("var b = true or read_int() == 1;");
        let main = main_fn(&functions);
        // The skip path loads the deciding value `true`.
        assert!(main.instructions.iter().any(|i| matches!(
            i,
            Instruction::LoadBoolConst { value: true, .. }
        )));
        assert_eq!(call_count(main, "or"), 0);
    }

    #[test]
    fn test_while_loop_shape() {
        let functions = lower("var i = 0; while i < 3 { i = i + 1; }");
        let main = main_fn(&functions);
        let labels: Vec<&str> = main
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Label { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert!(labels.iter().any(|l| l.starts_with("while_start")));
        assert!(labels.iter().any(|l| l.starts_with("while_body")));
        assert!(labels.iter().any(|l| l.starts_with("while_end")));
        // The back edge jumps to the loop start.
        assert!(main.instructions.iter().any(|i| matches!(
            i,
            Instruction::Jump { target } if target.as_str().starts_with("while_start")
        )));
    }

    #[test]
    fn test_break_jumps_to_loop_end_and_continue_to_start() {
        let functions =
            lower("var i = 0; while true { if i == 3 { break; } continue; }");
        let main = main_fn(&functions);
        assert!(main.instructions.iter().any(|i| matches!(
            i,
            Instruction::Jump { target } if target.as_str().starts_with("while_end")
        )));
        assert!(main.instructions.iter().any(|i| matches!(
            i,
            Instruction::Jump { target } if target.as_str().starts_with("while_start")
        )));
    }

    #[test]
    fn test_break_in_condition_jumps_to_loop_end() {
        let functions = lower("while { break; true } do print_int(1);");
        let main = main_fn(&functions);
        // The break's jump out of the condition precedes the CondJump.
        let break_jump = main
            .instructions
            .iter()
            .position(|i| matches!(
                i,
                Instruction::Jump { target } if target.as_str().starts_with("while_end")
            ))
            .expect("break jump");
        let cond_jump = main
            .instructions
            .iter()
            .position(|i| matches!(i, Instruction::CondJump { .. }))
            .expect("conditional jump");
        assert!(break_jump < cond_jump, "IR was:\n{}", main);
    }

    #[test]
    fn test_break_value_materializes_into_loop_result() {
        let functions = lower("while true { break 42; }");
        let main = main_fn(&functions);
        // The 42 is copied somewhere before the jump out of the loop.
        let copy_after_load = main.instructions.windows(2).any(|w| {
            matches!(&w[0], Instruction::LoadIntConst { value: 42, dest } if matches!(&w[1], Instruction::Copy { source, .. } if source == dest))
        });
        assert!(copy_after_load, "IR was:\n{}", main);
    }

    #[test]
    fn test_if_with_value_merges_branches() {
        let functions = lower("var x = if 1 < 2 then 10 else 20; print_int(x);");
        let main = main_fn(&functions);
        // Both branch values are copied into the merged destination.
        let copies = main
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Copy { dest, .. } => Some(dest.clone()),
                _ => None,
            })
            .collect::<Vec<_>>();
        let merged = copies
            .iter()
            .find(|d| copies.iter().filter(|o| o == d).count() == 2);
        assert!(merged.is_some(), "IR was:\n{}", main);
    }

    #[test]
    fn test_function_lowering_binds_params_and_returns_trailing_value() {
        let functions = lower("fun sq(x: Int): Int { x * x } print_int(sq(3));");
        let sq = functions.iter().find(|f| f.name == "sq").expect("sq");
        assert_eq!(sq.params.len(), 1);
        assert_eq!(sq.var_type(&sq.params[0]), Some(&Type::Int));
        assert!(matches!(
            sq.instructions.last(),
            Some(Instruction::Return { value: Some(_) })
        ));
        // The call site in main references the function by name.
        assert_eq!(call_count(main_fn(&functions), "sq"), 1);
    }

    #[test]
    fn test_explicit_return_suppresses_trailing_return() {
        let functions = lower("fun sq(x: Int): Int { return x * x; }");
        let sq = functions.iter().find(|f| f.name == "sq").expect("sq");
        let returns = sq
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Return { .. }))
            .count();
        assert_eq!(returns, 1);
    }

    #[test]
    fn test_unit_function_returns_without_value() {
        let functions = lower("fun hello(): Unit { print_int(1); }");
        let hello = functions.iter().find(|f| f.name == "hello").expect("hello");
        assert!(matches!(
            hello.instructions.last(),
            Some(Instruction::Return { value: None })
        ));
    }

    #[test]
    fn test_var_types_side_table_is_populated() {
        let functions = lower("var x = 1; var b = true; print_int(x);");
        let main = main_fn(&functions);
        for instr in &main.instructions {
            if let Instruction::Call { args, dest, .. } = instr {
                assert!(main.var_type(dest).is_some());
                for a in args {
                    assert!(main.var_type(a).is_some(), "untyped arg {}", a);
                }
            }
        }
        assert!(main.var_types.values().any(|t| *t == Type::Bool));
    }

    #[test]
    fn test_assignment_copies_into_variable_slot() {
        let functions = lower("var x = 1; x = 2; print_int(x);");
        let main = main_fn(&functions);
        // Two copies into x's variable: the initializer and the assignment.
        let copy_dests: Vec<&IrVar> = main
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Copy { dest, .. } => Some(dest),
                _ => None,
            })
            .collect();
        assert_eq!(copy_dests.len(), 2);
        assert_eq!(copy_dests[0], copy_dests[1]);
    }
}

//! x86-64 assembly generation
//!
//! Emits AT&T-syntax GAS text for the System V AMD64 ABI (Linux).
//! Allocation is deliberately naive: every IR variable lives in one
//! 8-byte stack slot for the whole function, and every value moves
//! through `%rax`. Operators lower to inline instruction sequences;
//! user functions and runtime builtins become real `call`s with the
//! first six arguments in registers.
//!
//! # Module structure
//!
//! - `frame.rs`: per-function slot assignment
//! - `intrinsics.rs`: inline operator sequences
//! - `error.rs`: error type
//!
//! Labels arriving from the IR are unique per function; they are
//! emitted as assembler-local `.L<function>_<label>` names so the
//! symbol table of the final object stays clean. Only `main` is
//! exported.

mod error;
mod frame;
mod intrinsics;

pub use error::CodeGenError;

use crate::builtins::RUNTIME_SYMBOLS;
use crate::config::CompilerConfig;
use crate::ir::{Instruction, IrFunction, Label};
use frame::Frame;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Integer argument registers in System V AMD64 order.
const ARG_REGISTERS: &[&str] = &["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];

pub struct AsmGen {
    output: String,
    /// Callee name -> link symbol for config-registered externals.
    external_symbols: HashMap<String, String>,
}

impl Default for AsmGen {
    fn default() -> Self {
        Self::new()
    }
}

impl AsmGen {
    pub fn new() -> Self {
        AsmGen {
            output: String::new(),
            external_symbols: HashMap::new(),
        }
    }

    /// Generate the complete assembly file for a lowered module.
    pub fn codegen_program(
        &mut self,
        functions: &[IrFunction],
        config: &CompilerConfig,
    ) -> Result<String, CodeGenError> {
        self.external_symbols = config.external_symbol_map();

        writeln!(self.output, ".global main")?;
        for symbol in RUNTIME_SYMBOLS {
            writeln!(self.output, ".extern {}", symbol)?;
        }
        let mut extern_symbols: Vec<&String> = self.external_symbols.values().collect();
        extern_symbols.sort();
        for symbol in extern_symbols {
            writeln!(self.output, ".extern {}", symbol)?;
        }
        writeln!(self.output, ".text")?;

        for fun in functions {
            self.codegen_function(fun)?;
        }

        // Mark the stack non-executable so the linker stays quiet.
        writeln!(self.output)?;
        writeln!(self.output, ".section .note.GNU-stack,\"\",@progbits")?;
        Ok(std::mem::take(&mut self.output))
    }

    fn codegen_function(&mut self, fun: &IrFunction) -> Result<(), CodeGenError> {
        let frame = Frame::build(fun);

        writeln!(self.output)?;
        writeln!(self.output, "{}:", fun.name)?;
        writeln!(self.output, "    pushq %rbp")?;
        writeln!(self.output, "    movq %rsp, %rbp")?;
        if frame.size() > 0 {
            writeln!(self.output, "    subq ${}, %rsp", frame.size())?;
        }

        for (i, param) in fun.params.iter().enumerate() {
            let slot = frame.slot(param)?;
            if let Some(register) = ARG_REGISTERS.get(i) {
                writeln!(self.output, "    movq {}, {}", register, slot)?;
            } else {
                // Arguments beyond six were pushed by the caller and
                // sit above the saved %rbp and return address.
                let offset = 16 + 8 * (i - ARG_REGISTERS.len());
                writeln!(self.output, "    movq {}(%rbp), %rax", offset)?;
                writeln!(self.output, "    movq %rax, {}", slot)?;
            }
        }

        for instr in &fun.instructions {
            self.codegen_instruction(fun, &frame, instr)?;
        }
        Ok(())
    }

    fn codegen_instruction(
        &mut self,
        fun: &IrFunction,
        frame: &Frame,
        instr: &Instruction,
    ) -> Result<(), CodeGenError> {
        writeln!(self.output, "    # {}", instr)?;
        match instr {
            Instruction::LoadIntConst { value, dest } => {
                let slot = frame.slot(dest)?;
                if i32::try_from(*value).is_ok() {
                    writeln!(self.output, "    movq ${}, {}", value, slot)?;
                } else {
                    // movq only takes a sign-extended 32-bit immediate.
                    writeln!(self.output, "    movabsq ${}, %rax", value)?;
                    writeln!(self.output, "    movq %rax, {}", slot)?;
                }
            }

            Instruction::LoadBoolConst { value, dest } => {
                let slot = frame.slot(dest)?;
                writeln!(self.output, "    movq ${}, {}", *value as i64, slot)?;
            }

            Instruction::Copy { source, dest } => {
                if source != dest {
                    writeln!(self.output, "    movq {}, %rax", frame.slot(source)?)?;
                    writeln!(self.output, "    movq %rax, {}", frame.slot(dest)?)?;
                }
            }

            Instruction::Call { callee, args, dest } => {
                let slots = args
                    .iter()
                    .map(|a| frame.slot(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let dest_slot = frame.slot(dest)?;
                if intrinsics::is_intrinsic(callee) {
                    intrinsics::emit(&mut self.output, callee, &slots, &dest_slot)?;
                } else {
                    self.codegen_call(callee, &slots, &dest_slot)?;
                }
            }

            Instruction::Jump { target } => {
                writeln!(self.output, "    jmp {}", local_label(fun, target))?;
            }

            Instruction::CondJump {
                condition,
                then_target,
                else_target,
            } => {
                writeln!(self.output, "    cmpq $0, {}", frame.slot(condition)?)?;
                writeln!(self.output, "    jne {}", local_label(fun, then_target))?;
                writeln!(self.output, "    jmp {}", local_label(fun, else_target))?;
            }

            Instruction::Label { name } => {
                writeln!(self.output, "{}:", local_label(fun, name))?;
            }

            Instruction::Return { value } => {
                if let Some(value) = value {
                    writeln!(self.output, "    movq {}, %rax", frame.slot(value)?)?;
                }
                writeln!(self.output, "    movq %rbp, %rsp")?;
                writeln!(self.output, "    popq %rbp")?;
                writeln!(self.output, "    ret")?;
            }
        }
        Ok(())
    }

    /// A real call: registers for the first six arguments, the rest
    /// pushed right-to-left with an alignment pad when their count is
    /// odd. Frames are 16-byte rounded, so `%rsp` is aligned here.
    fn codegen_call(
        &mut self,
        callee: &str,
        args: &[String],
        dest: &str,
    ) -> Result<(), CodeGenError> {
        let symbol = self
            .external_symbols
            .get(callee)
            .map(String::as_str)
            .unwrap_or(callee);

        for (slot, register) in args.iter().zip(ARG_REGISTERS) {
            writeln!(self.output, "    movq {}, {}", slot, register)?;
        }
        let stack_args = args.get(ARG_REGISTERS.len()..).unwrap_or(&[]);
        let pad = stack_args.len() % 2 == 1;
        if pad {
            writeln!(self.output, "    subq $8, %rsp")?;
        }
        for slot in stack_args.iter().rev() {
            writeln!(self.output, "    pushq {}", slot)?;
        }
        writeln!(self.output, "    call {}", symbol)?;
        let spilled = stack_args.len() + pad as usize;
        if spilled > 0 {
            writeln!(self.output, "    addq ${}, %rsp", 8 * spilled)?;
        }
        writeln!(self.output, "    movq %rax, {}", dest)?;
        Ok(())
    }
}

fn local_label(fun: &IrFunction, label: &Label) -> String {
    format!(".L{}_{}", fun.name, label)
}

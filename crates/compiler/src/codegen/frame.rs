//! Stack frame layout
//!
//! Every IR variable gets one 8-byte slot below `%rbp` for the whole
//! function lifetime; there is no register allocation. Slots are
//! assigned in first-appearance order (parameters first), and the
//! frame is rounded up to 16 bytes so `%rsp` stays aligned at call
//! boundaries.

use super::CodeGenError;
use crate::ir::{Instruction, IrFunction, IrVar};
use std::collections::HashMap;

pub(super) struct Frame {
    offsets: HashMap<IrVar, i64>,
}

impl Frame {
    pub fn build(fun: &IrFunction) -> Frame {
        let mut frame = Frame {
            offsets: HashMap::new(),
        };
        for p in &fun.params {
            frame.add(p);
        }
        for instr in &fun.instructions {
            match instr {
                Instruction::LoadIntConst { dest, .. }
                | Instruction::LoadBoolConst { dest, .. } => frame.add(dest),
                Instruction::Copy { source, dest } => {
                    frame.add(source);
                    frame.add(dest);
                }
                Instruction::Call { args, dest, .. } => {
                    for a in args {
                        frame.add(a);
                    }
                    frame.add(dest);
                }
                Instruction::CondJump { condition, .. } => frame.add(condition),
                Instruction::Return { value: Some(v) } => frame.add(v),
                Instruction::Return { value: None }
                | Instruction::Jump { .. }
                | Instruction::Label { .. } => {}
            }
        }
        frame
    }

    fn add(&mut self, var: &IrVar) {
        if !self.offsets.contains_key(var) {
            let offset = -8 * (self.offsets.len() as i64 + 1);
            self.offsets.insert(var.clone(), offset);
        }
    }

    /// Total frame size in bytes, rounded up to 16.
    pub fn size(&self) -> i64 {
        let used = self.offsets.len() as i64 * 8;
        (used + 15) / 16 * 16
    }

    /// `%rbp`-relative operand for a variable's slot.
    pub fn slot(&self, var: &IrVar) -> Result<String, CodeGenError> {
        self.offsets
            .get(var)
            .map(|offset| format!("{}(%rbp)", offset))
            .ok_or_else(|| {
                CodeGenError::Logic(format!("no stack slot for IR variable '{}'", var))
            })
    }
}

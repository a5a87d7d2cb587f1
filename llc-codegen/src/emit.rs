//! IR to stack machine assembly
//!
//! The emitter walks the program once and translates every instruction
//! with the rule for its kind. Output lines keep the input order; nothing
//! is merged or reordered across instructions.
//!
//! Calling convention: the caller saves every variable of its own
//! subroutine on the stack, pushes a return address placeholder and jumps.
//! The callee writes its value into the shared `result` slot and returns by
//! popping the return address. The caller then restores its variables in
//! reverse order and copies `result` into the call's destination.

use crate::asm::{render, AsmLine, Edge, Label, Operand};
use llc_common::{StoreError, Variable, VariableStore};
use llc_ir::{decode_program, Instruction, IrError, Opcode, RawInstruction, Status, Value};
use log::{debug, info, trace, warn};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error(transparent)]
    Ir(#[from] IrError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("'{label}' needs a condition at its {status} marker")]
    MissingCondition { label: String, status: Status },
}

/// The subroutine whose body is being translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubContext {
    pub name: String,
    pub result: Variable,
}

/// Translation state threaded through the rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitContext {
    current: Option<SubContext>,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&SubContext> {
        self.current.as_ref()
    }

    fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|sub| sub.name.as_str())
    }
}

/// Translates a whole IR program against a variable store
pub struct Emitter<'s, S: VariableStore + ?Sized> {
    store: &'s S,
    lines: Vec<AsmLine>,
}

impl<'s, S: VariableStore + ?Sized> Emitter<'s, S> {
    /// Translate a typed program
    pub fn new(program: &[Instruction], store: &'s S) -> Result<Self, CodegenError> {
        info!("Emitting assembly for {} IR instructions", program.len());
        let mut emitter = Self {
            store,
            lines: Vec::new(),
        };
        let mut ctx = EmitContext::new();

        for inst in program {
            trace!("  {}", inst);
            let lines = emitter.translate(&mut ctx, inst)?;
            emitter.lines.extend(lines);
        }

        debug!("Emitted {} assembly lines", emitter.lines.len());
        Ok(emitter)
    }

    /// Translate the front end's raw tagged form. An unrecognized tag
    /// anywhere fails before a single line is emitted.
    pub fn from_raw(raw: &[RawInstruction], store: &'s S) -> Result<Self, CodegenError> {
        let program = decode_program(raw)?;
        Self::new(&program, store)
    }

    pub fn lines(&self) -> &[AsmLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<AsmLine> {
        self.lines
    }

    /// Program text, one line per instruction or marker
    pub fn text(&self) -> String {
        render(&self.lines)
    }

    fn translate(&self, ctx: &mut EmitContext, inst: &Instruction) -> Result<Vec<AsmLine>, CodegenError> {
        match inst {
            Instruction::Sub { status, name, result } => Ok(self.sub(ctx, *status, name, *result)),
            Instruction::Op { opcode, args, result } => Ok(vec![self.builtin(*opcode, args, *result)]),
            Instruction::Call { callee, result, .. } => self.call(ctx, callee, *result),
            Instruction::Return { value } => self.ret(ctx, value),
            Instruction::Assign { variable, value } => Ok(vec![self.assign(*variable, value)]),
            Instruction::If { status, id, condition } => self.if_block(*status, id, condition.as_ref()),
            Instruction::While { status, id, condition } => self.while_loop(*status, id, condition.as_ref()),
        }
    }

    fn sub(&self, ctx: &mut EmitContext, status: Status, name: &str, result: Variable) -> Vec<AsmLine> {
        let label = Label::Sub(name.to_string());
        match status {
            Status::Start => {
                if let Some(open) = ctx.current() {
                    warn!("Subroutine '{}' starts before '{}' ended", name, open.name);
                }
                debug!("Entering subroutine '{}' (result {})", name, result);
                ctx.current = Some(SubContext {
                    name: name.to_string(),
                    result,
                });
                vec![AsmLine::Marker(Edge::Start, label)]
            }
            Status::End => {
                debug!("Leaving subroutine '{}'", name);
                ctx.current = None;
                vec![AsmLine::Marker(Edge::End, label)]
            }
        }
    }

    fn builtin(&self, opcode: Opcode, args: &[Value], result: Variable) -> AsmLine {
        AsmLine::Op {
            opcode,
            sources: args.iter().map(Operand::source).collect(),
            dest: Operand::Dest(result),
        }
    }

    fn call(&self, ctx: &EmitContext, callee: &str, result: Variable) -> Result<Vec<AsmLine>, CodegenError> {
        let returned = self.store.result()?;
        let saved = self.store.subroutine_variables(ctx.current_name());
        debug!(
            "Call to '{}' from {:?} saves {} variables",
            callee,
            ctx.current_name(),
            saved.len()
        );

        let mut lines = Vec::with_capacity(2 * saved.len() + 3);
        for var in &saved {
            lines.push(push(Operand::Source(*var)));
        }
        lines.push(push(Operand::ReturnAddress));
        lines.push(AsmLine::Call(callee.to_string()));
        for var in saved.iter().rev() {
            lines.push(pop(Operand::Dest(*var)));
        }
        lines.push(AsmLine::Move(Operand::Source(returned), Operand::Dest(result)));
        Ok(lines)
    }

    fn ret(&self, ctx: &EmitContext, value: &Value) -> Result<Vec<AsmLine>, CodegenError> {
        let returned = self.store.result()?;
        match ctx.current() {
            Some(sub) => trace!("Return {} from '{}' (declared result {})", value, sub.name, sub.result),
            None => warn!("Return {} outside of any subroutine", value),
        }
        Ok(vec![
            AsmLine::Move(Operand::source(value), Operand::Dest(returned)),
            pop(Operand::Int(0)),
        ])
    }

    fn assign(&self, variable: Variable, value: &Value) -> AsmLine {
        AsmLine::Move(Operand::source(value), Operand::Dest(variable))
    }

    /// `if` skips to its end when the condition is non-zero; its closing
    /// marker emits no jump.
    fn if_block(&self, status: Status, id: &str, condition: Option<&Value>) -> Result<Vec<AsmLine>, CodegenError> {
        let label = Label::If(id.to_string());
        match status {
            Status::Start => {
                let cond = required_condition(&label, status, condition)?;
                Ok(vec![
                    AsmLine::Marker(Edge::Start, label.clone()),
                    AsmLine::BranchNonZero(cond, Edge::End, label),
                    AsmLine::Nop,
                ])
            }
            Status::End => Ok(vec![AsmLine::Marker(Edge::End, label)]),
        }
    }

    /// Pre-test loop with the test at the bottom: the start jumps straight
    /// to the check, the end jumps back while the condition holds.
    fn while_loop(&self, status: Status, id: &str, condition: Option<&Value>) -> Result<Vec<AsmLine>, CodegenError> {
        let label = Label::While(id.to_string());
        match status {
            Status::Start => Ok(vec![
                AsmLine::Jump(Edge::End, label.clone()),
                AsmLine::Nop,
                AsmLine::Marker(Edge::Start, label),
            ]),
            Status::End => {
                let cond = required_condition(&label, status, condition)?;
                Ok(vec![
                    AsmLine::Marker(Edge::End, label.clone()),
                    AsmLine::BranchNonZero(cond, Edge::Start, label),
                    AsmLine::Nop,
                ])
            }
        }
    }
}

fn required_condition(label: &Label, status: Status, condition: Option<&Value>) -> Result<Operand, CodegenError> {
    condition
        .map(Operand::source)
        .ok_or_else(|| CodegenError::MissingCondition {
            label: label.to_string(),
            status,
        })
}

pub fn push(operand: Operand) -> AsmLine {
    AsmLine::Push(operand)
}

pub fn pop(operand: Operand) -> AsmLine {
    AsmLine::Pop(operand)
}

//! Stack Machine Assembly Definitions
//!
//! This module defines the operand encoding and the line forms emitted for
//! the target stack machine. Jump targets stay symbolic: `{}` placeholders
//! and `Start X`/`End X` label references are resolved by a later pass.

use llc_common::Variable;
use llc_ir::{Opcode, Status, Value};
use std::fmt;

/// Placeholder for a value bound by the later resolution pass
pub const PLACEHOLDER: &str = "{}";

/// An operand as written in an instruction line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Read position: `A<offset>` direct, `B<offset>` through a pointer
    Source(Variable),
    /// Write position: `<offset>` direct, `A<offset>` through a pointer
    Dest(Variable),
    Int(i64),
    Literal(String),
    /// Return address pushed before a call: the slot two past the push
    ReturnAddress,
}

impl Operand {
    /// Source encoding of an IR value; literals pass through unchanged
    pub fn source(value: &Value) -> Self {
        match value {
            Value::Var(var) => Operand::Source(*var),
            Value::Int(n) => Operand::Int(*n),
            Value::Literal(text) => Operand::Literal(text.clone()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Source(var) => {
                let mode = if var.is_pointer { "B" } else { "A" };
                write!(f, "{}{}", mode, var.offset)
            }
            Operand::Dest(var) => {
                let mode = if var.is_pointer { "A" } else { "" };
                write!(f, "{}{}", mode, var.offset)
            }
            Operand::Int(n) => write!(f, "{}", n),
            Operand::Literal(text) => write!(f, "{}", text),
            Operand::ReturnAddress => write!(f, "{}; +2", PLACEHOLDER),
        }
    }
}

/// Named jump target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Sub(String),
    If(String),
    While(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Sub(name) => write!(f, "{}", name),
            Label::If(id) => write!(f, "if_{}", id),
            Label::While(id) => write!(f, "while_{}", id),
        }
    }
}

/// Which end of a labeled region a marker or jump refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Start,
    End,
}

impl From<Status> for Edge {
    fn from(status: Status) -> Self {
        match status {
            Status::Start => Edge::Start,
            Status::End => Edge::End,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Start => write!(f, "Start"),
            Edge::End => write!(f, "End"),
        }
    }
}

/// One emitted line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmLine {
    /// `#Start X` / `#End X`
    Marker(Edge, Label),

    /// Builtin operation: `OP src... dst`
    Op {
        opcode: Opcode,
        sources: Vec<Operand>,
        dest: Operand,
    },

    /// dst = src, encoded as an always-taken `MLZ -1`
    Move(Operand, Operand),

    /// Unconditional jump to a label edge
    Jump(Edge, Label),

    /// Jump to a label edge when the condition is non-zero
    BranchNonZero(Operand, Edge, Label),

    /// Transfer to a user subroutine
    Call(String),

    /// Filler executed on the fall-through path of a branch
    Nop,

    Push(Operand),
    Pop(Operand),
}

impl fmt::Display for AsmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmLine::Marker(edge, label) => write!(f, "#{} {}", edge, label),
            AsmLine::Op { opcode, sources, dest } => {
                write!(f, "{}", opcode)?;
                for src in sources {
                    write!(f, " {}", src)?;
                }
                write!(f, " {}", dest)
            }
            AsmLine::Move(src, dst) => write!(f, "MLZ -1 {} {}", src, dst),
            AsmLine::Jump(edge, label) => write!(f, "MLZ -1 {} 0; {} {}", PLACEHOLDER, edge, label),
            AsmLine::BranchNonZero(cond, edge, label) => {
                write!(f, "MNZ {} {} 0; {} {}", cond, PLACEHOLDER, edge, label)
            }
            AsmLine::Call(callee) => write!(f, "MLZ -1 {} 0; {}", PLACEHOLDER, callee),
            AsmLine::Nop => write!(f, "MLZ 0 0 0"),
            AsmLine::Push(src) => write!(f, "PUSH {}", src),
            AsmLine::Pop(dst) => write!(f, "POP {}", dst),
        }
    }
}

/// Join lines into program text, one per line
pub fn render(lines: &[AsmLine]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

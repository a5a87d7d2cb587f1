//! Typed Intermediate Representation
//!
//! Each instruction is one unit of translation. Builtin machine operations
//! and user subroutine calls are distinct variants; the front end's
//! `__NAME__` wrapper convention is only understood while decoding.

use llc_common::Variable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IR Value - what an instruction reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Storage slot
    Var(Variable),

    /// Integer literal, emitted as written
    Int(i64),

    /// Raw literal text, emitted as written
    Literal(String),
}

impl From<Variable> for Value {
    fn from(var: Variable) -> Self {
        Value::Var(var)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Literal(text.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var(var) => write!(f, "{}", var),
            Value::Int(value) => write!(f, "{}", value),
            Value::Literal(text) => write!(f, "{:?}", text),
        }
    }
}

/// Opening or closing marker of a paired construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Start,
    End,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Start => write!(f, "start"),
            Status::End => write!(f, "end"),
        }
    }
}

/// Primitive operations of the target machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Opcode {
    Mnz, // move if not zero
    Mlz, // move if less than zero
    Add,
    Sub,
    And,
    Or,
    Xor,
    Ant, // and-not
    Sl,  // shift left
    Srl, // shift right logical
    Sra, // shift right arithmetic
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::Mnz, Opcode::Mlz, Opcode::Add, Opcode::Sub,
        Opcode::And, Opcode::Or, Opcode::Xor, Opcode::Ant,
        Opcode::Sl, Opcode::Srl, Opcode::Sra,
    ];

    /// Assembly mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Mnz => "MNZ",
            Opcode::Mlz => "MLZ",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Ant => "ANT",
            Opcode::Sl => "SL",
            Opcode::Srl => "SRL",
            Opcode::Sra => "SRA",
        }
    }

    /// Recognise the front end's `__NAME__` callee form
    pub fn from_wrapped(callee: &str) -> Option<Opcode> {
        callee
            .strip_prefix("__")
            .and_then(|rest| rest.strip_suffix("__"))
            .and_then(|name| name.parse().ok())
    }
}

impl FromStr for Opcode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| format!("unknown opcode '{}'", s))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// IR Instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    /// Subroutine boundary
    Sub {
        status: Status,
        name: String,
        result: Variable,
    },

    /// Builtin operation: result = op args...
    Op {
        opcode: Opcode,
        args: Vec<Value>,
        result: Variable,
    },

    /// User subroutine call: result = callee(args...)
    Call {
        callee: String,
        args: Vec<Value>,
        result: Variable,
    },

    /// Return from the enclosing subroutine
    Return { value: Value },

    /// variable = value
    Assign { variable: Variable, value: Value },

    /// Conditional block marker; the condition is read at `start`
    If {
        status: Status,
        id: String,
        condition: Option<Value>,
    },

    /// Loop marker; the condition is read at `end`
    While {
        status: Status,
        id: String,
        condition: Option<Value>,
    },
}

impl Instruction {
    /// Tag name used by the raw form
    pub fn tag(&self) -> &'static str {
        match self {
            Instruction::Sub { .. } => "sub",
            Instruction::Op { .. } | Instruction::Call { .. } => "call_sub",
            Instruction::Return { .. } => "return",
            Instruction::Assign { .. } => "assign",
            Instruction::If { .. } => "if",
            Instruction::While { .. } => "while",
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Value]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 { write!(f, ", ")?; }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Sub { status, name, result } => {
                write!(f, "sub {} {} -> {}", status, name, result)
            }
            Instruction::Op { opcode, args, result } => {
                write!(f, "{} = {} ", result, opcode)?;
                write_args(f, args)
            }
            Instruction::Call { callee, args, result } => {
                write!(f, "{} = call {}(", result, callee)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Instruction::Return { value } => write!(f, "return {}", value),
            Instruction::Assign { variable, value } => write!(f, "{} = {}", variable, value),
            Instruction::If { status, id, condition } | Instruction::While { status, id, condition } => {
                write!(f, "{} {} {}", self.tag(), status, id)?;
                if let Some(condition) = condition {
                    write!(f, " ({})", condition)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_wrapped() {
        assert_eq!(Opcode::from_wrapped("__ADD__"), Some(Opcode::Add));
        assert_eq!(Opcode::from_wrapped("__SRA__"), Some(Opcode::Sra));
        assert_eq!(Opcode::from_wrapped("ADD"), None);
        assert_eq!(Opcode::from_wrapped("__MUL__"), None);
        assert_eq!(Opcode::from_wrapped("__add__"), None);
        assert_eq!(Opcode::from_wrapped("fib"), None);
    }

    #[test]
    fn test_every_opcode_parses_its_mnemonic() {
        for op in Opcode::ALL {
            assert_eq!(op.mnemonic().parse::<Opcode>(), Ok(op));
        }
    }

    #[test]
    fn test_value_untagged_json() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[{"offset": 3, "is_pointer": true}, -1, "{}"]"#).unwrap();
        assert_eq!(
            values,
            vec![Value::Var(Variable::pointer(3)), Value::Int(-1), Value::Literal("{}".to_string())]
        );
    }

    #[test]
    fn test_instruction_display() {
        let inst = Instruction::Op {
            opcode: Opcode::Add,
            args: vec![Variable::direct(1).into(), Value::Int(2)],
            result: Variable::pointer(3),
        };
        assert_eq!(format!("{}", inst), "*[3] = ADD [1], 2");

        let inst = Instruction::While {
            status: Status::End,
            id: "4".to_string(),
            condition: Some(Variable::direct(5).into()),
        };
        assert_eq!(format!("{}", inst), "while end 4 ([5])");
    }
}

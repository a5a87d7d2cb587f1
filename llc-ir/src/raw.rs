//! Raw tagged instruction form
//!
//! The front end writes each instruction as a JSON array whose head is the
//! tag string and whose tail holds the positional arguments:
//!
//! ```text
//! ["sub", "start", "main", {"offset": 0}]
//! ["call_sub", "__ADD__", [{"offset": 1}, 2], {"offset": 3, "is_pointer": true}]
//! ["if", "start", 7, {"offset": 1}]
//! ```
//!
//! Decoding is all-or-nothing: an unrecognized tag anywhere in the program
//! fails the whole decode.

use crate::ir::{Instruction, Opcode, Value};
use llc_common::Variable;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("Unrecognized instruction tag '{tag}' at index {index}")]
    UnknownInstruction { index: usize, tag: String },

    #[error("Malformed '{tag}' instruction at index {index}: {message}")]
    MalformedInstruction {
        index: usize,
        tag: String,
        message: String,
    },

    #[error("Invalid IR JSON: {message}")]
    Json { message: String },
}

impl From<serde_json::Error> for IrError {
    fn from(err: serde_json::Error) -> Self {
        IrError::Json {
            message: err.to_string(),
        }
    }
}

/// Tags the emitter knows how to translate
pub const KNOWN_TAGS: [&str; 6] = ["sub", "call_sub", "return", "assign", "if", "while"];

/// One instruction as written by the front end, before its tag is checked
#[derive(Debug, Clone, PartialEq)]
pub struct RawInstruction {
    pub tag: String,
    pub args: Vec<serde_json::Value>,
}

impl RawInstruction {
    pub fn new(tag: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self { tag: tag.into(), args }
    }

    /// Split a JSON array into its tag and arguments
    pub fn from_json(index: usize, value: serde_json::Value) -> Result<Self, IrError> {
        let mut items = match value {
            serde_json::Value::Array(items) => items.into_iter(),
            other => {
                return Err(IrError::MalformedInstruction {
                    index,
                    tag: String::new(),
                    message: format!("expected a tagged array, found {}", other),
                })
            }
        };

        match items.next() {
            Some(serde_json::Value::String(tag)) => Ok(Self::new(tag, items.collect())),
            _ => Err(IrError::MalformedInstruction {
                index,
                tag: String::new(),
                message: "instruction array must start with a tag string".to_string(),
            }),
        }
    }

    pub fn is_known(&self) -> bool {
        KNOWN_TAGS.contains(&self.tag.as_str())
    }

    /// Decode into the typed form. `index` is the position in the program,
    /// used for error reporting only.
    pub fn decode(&self, index: usize) -> Result<Instruction, IrError> {
        trace!("Decoding raw instruction {}: {} {:?}", index, self.tag, self.args);
        let inst = match self.tag.as_str() {
            "sub" => Instruction::Sub {
                status: self.arg(index, 0)?,
                name: self.arg(index, 1)?,
                result: self.arg(index, 2)?,
            },
            "call_sub" => {
                let callee: String = self.arg(index, 0)?;
                let args: Vec<Value> = self.arg(index, 1)?;
                let result: Variable = self.arg(index, 2)?;
                match Opcode::from_wrapped(&callee) {
                    Some(opcode) => Instruction::Op { opcode, args, result },
                    None => Instruction::Call { callee, args, result },
                }
            }
            "return" => Instruction::Return {
                value: self.arg(index, 0)?,
            },
            "assign" => Instruction::Assign {
                variable: self.arg(index, 0)?,
                value: self.arg(index, 1)?,
            },
            "if" => Instruction::If {
                status: self.arg(index, 0)?,
                id: self.label_id(index, 1)?,
                condition: self.arg(index, 2)?,
            },
            "while" => Instruction::While {
                status: self.arg(index, 0)?,
                id: self.label_id(index, 1)?,
                condition: self.arg(index, 2)?,
            },
            _ => {
                return Err(IrError::UnknownInstruction {
                    index,
                    tag: self.tag.clone(),
                })
            }
        };
        Ok(inst)
    }

    /// Positional argument; a missing trailing argument decodes as `null`
    fn arg<T: DeserializeOwned>(&self, index: usize, position: usize) -> Result<T, IrError> {
        let value = self
            .args
            .get(position)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).map_err(|err| self.malformed(index, format!("argument {}: {}", position, err)))
    }

    /// Label identifiers may be written as strings or integers
    fn label_id(&self, index: usize, position: usize) -> Result<String, IrError> {
        match self.args.get(position) {
            Some(serde_json::Value::String(id)) => Ok(id.clone()),
            Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
            other => Err(self.malformed(index, format!("argument {}: expected label id, found {:?}", position, other))),
        }
    }

    fn malformed(&self, index: usize, message: String) -> IrError {
        IrError::MalformedInstruction {
            index,
            tag: self.tag.clone(),
            message,
        }
    }
}

/// Parse a JSON array of raw instructions without checking their tags
pub fn parse_raw_program(text: &str) -> Result<Vec<RawInstruction>, IrError> {
    let items: Vec<serde_json::Value> = serde_json::from_str(text)?;
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| RawInstruction::from_json(index, item))
        .collect()
}

/// Decode a whole program. Tags are checked for every instruction before
/// any argument is decoded, so an unrecognized tag is always the reported
/// error.
pub fn decode_program(raw: &[RawInstruction]) -> Result<Vec<Instruction>, IrError> {
    if let Some((index, inst)) = raw.iter().enumerate().find(|(_, inst)| !inst.is_known()) {
        return Err(IrError::UnknownInstruction {
            index,
            tag: inst.tag.clone(),
        });
    }

    let program = raw
        .iter()
        .enumerate()
        .map(|(index, inst)| inst.decode(index))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Decoded {} IR instructions", program.len());
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Status;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn var(offset: u32, is_pointer: bool) -> serde_json::Value {
        json!({ "offset": offset, "is_pointer": is_pointer })
    }

    #[test]
    fn test_decode_sub() {
        let raw = RawInstruction::new("sub", vec![json!("start"), json!("main"), var(0, false)]);
        assert_eq!(
            raw.decode(0).unwrap(),
            Instruction::Sub {
                status: Status::Start,
                name: "main".to_string(),
                result: Variable::direct(0),
            }
        );
    }

    #[test]
    fn test_decode_builtin_and_user_calls() {
        let raw = RawInstruction::new("call_sub", vec![json!("__XOR__"), json!([var(1, true), 4]), var(2, false)]);
        assert_eq!(
            raw.decode(0).unwrap(),
            Instruction::Op {
                opcode: Opcode::Xor,
                args: vec![Value::Var(Variable::pointer(1)), Value::Int(4)],
                result: Variable::direct(2),
            }
        );

        let raw = RawInstruction::new("call_sub", vec![json!("fib"), json!([var(1, false)]), var(2, false)]);
        assert_eq!(
            raw.decode(0).unwrap(),
            Instruction::Call {
                callee: "fib".to_string(),
                args: vec![Value::Var(Variable::direct(1))],
                result: Variable::direct(2),
            }
        );
    }

    #[test]
    fn test_decode_control_flow_with_numeric_ids() {
        let raw = RawInstruction::new("if", vec![json!("start"), json!(3), var(5, false)]);
        assert_eq!(
            raw.decode(0).unwrap(),
            Instruction::If {
                status: Status::Start,
                id: "3".to_string(),
                condition: Some(Value::Var(Variable::direct(5))),
            }
        );

        // Condition may be omitted where it is not read
        let raw = RawInstruction::new("while", vec![json!("start"), json!("loop")]);
        assert_eq!(
            raw.decode(0).unwrap(),
            Instruction::While {
                status: Status::Start,
                id: "loop".to_string(),
                condition: None,
            }
        );
    }

    #[test]
    fn test_decode_return_literal() {
        let raw = RawInstruction::new("return", vec![json!(0)]);
        assert_eq!(raw.decode(0).unwrap(), Instruction::Return { value: Value::Int(0) });
    }

    #[test]
    fn test_unknown_tag() {
        let raw = RawInstruction::new("goto", vec![json!("somewhere")]);
        assert_eq!(
            raw.decode(4),
            Err(IrError::UnknownInstruction { index: 4, tag: "goto".to_string() })
        );
    }

    #[test]
    fn test_unknown_tag_wins_over_malformed_arguments() {
        let program = vec![
            RawInstruction::new("assign", vec![json!("not a variable")]),
            RawInstruction::new("goto", vec![]),
        ];
        assert_eq!(
            decode_program(&program),
            Err(IrError::UnknownInstruction { index: 1, tag: "goto".to_string() })
        );
    }

    #[test]
    fn test_malformed_arguments() {
        let raw = RawInstruction::new("sub", vec![json!("begin"), json!("main"), var(0, false)]);
        assert!(matches!(
            raw.decode(2),
            Err(IrError::MalformedInstruction { index: 2, .. })
        ));
    }

    #[test]
    fn test_parse_raw_program() {
        let text = r#"[
            ["sub", "start", "S", {"offset": 0}],
            ["assign", {"offset": 1}, 5],
            ["sub", "end", "S", {"offset": 0}]
        ]"#;
        let raw = parse_raw_program(text).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1].tag, "assign");

        let program = decode_program(&raw).unwrap();
        assert_eq!(
            program[1],
            Instruction::Assign { variable: Variable::direct(1), value: Value::Int(5) }
        );
    }

    #[test]
    fn test_parse_rejects_untagged_entries() {
        assert!(matches!(
            parse_raw_program(r#"[[1, 2]]"#),
            Err(IrError::MalformedInstruction { index: 0, .. })
        ));
        assert!(matches!(parse_raw_program("not json"), Err(IrError::Json { .. })));
    }
}

//! Low-Level Compiler - Intermediate Representation
//! 
//! The front end hands the emitter a flat list of structured instructions:
//! subroutine boundaries, assignments, builtin operations, subroutine calls,
//! returns, and paired `if`/`while` markers. This crate defines the typed
//! form of that list and decodes the front end's raw tagged form into it.

pub mod ir;
pub mod raw;

pub use ir::{Instruction, Value, Opcode, Status};
pub use raw::{RawInstruction, IrError, parse_raw_program, decode_program};

//! Low-Level Compiler - Stack Machine Code Generation
//! 
//! This crate handles the final phase of compilation: translating the
//! structured IR into flat, labeled stack machine assembly. It includes:
//! 
//! - Operand encoding for direct and pointer-indirect variables
//! - The caller-saves calling convention over the explicit stack
//! - Paired label markers for subroutines, conditionals and loops

pub mod asm;
pub mod emit;

pub use asm::{AsmLine, Edge, Label, Operand};
pub use emit::{Emitter, EmitContext, SubContext, CodegenError, push, pop};

use llc_common::VariableStore;
use llc_ir::{Instruction, RawInstruction};

/// Main entry point for code generation
pub fn generate_assembly<S>(program: &[Instruction], store: &S) -> Result<String, CodegenError>
where
    S: VariableStore + ?Sized,
{
    Ok(Emitter::new(program, store)?.text())
}

/// Code generation straight from the front end's raw tagged form
pub fn generate_assembly_from_raw<S>(raw: &[RawInstruction], store: &S) -> Result<String, CodegenError>
where
    S: VariableStore + ?Sized,
{
    Ok(Emitter::from_raw(raw, store)?.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use llc_common::{Variable, VariableTable};
    use llc_ir::{Status, Value};

    #[test]
    fn test_basic_code_generation() {
        let store = VariableTable::new().with("result", None, Variable::direct(0));
        let program = vec![
            Instruction::Sub { status: Status::Start, name: "main".to_string(), result: Variable::direct(0) },
            Instruction::Assign { variable: Variable::direct(1), value: Value::Int(42) },
            Instruction::Return { value: Variable::direct(1).into() },
            Instruction::Sub { status: Status::End, name: "main".to_string(), result: Variable::direct(0) },
        ];

        let asm = generate_assembly(&program, &store).unwrap();
        assert_eq!(asm, "#Start main\nMLZ -1 42 1\nMLZ -1 A1 0\nPOP 0\n#End main");
    }

    #[test]
    fn test_dyn_store() {
        let table = VariableTable::new().with("result", None, Variable::direct(0));
        let store: &dyn VariableStore = &table;
        let program = vec![Instruction::Return { value: Value::Int(1) }];
        assert_eq!(generate_assembly(&program, store).unwrap(), "MLZ -1 1 0\nPOP 0");
    }
}

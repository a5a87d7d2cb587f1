//! Variable store query interface
//! 
//! The emitter only reads from the store: it resolves the well-known
//! `result` slot and asks which variables are live inside a subroutine so
//! they can be saved around a call. The order of that set is the push
//! order at call sites; pops happen in reverse.

use crate::error::StoreError;
use crate::types::{SlotOffset, Variable};
use serde::{Deserialize, Serialize};

/// Name of the slot every subroutine writes its return value into
pub const RESULT_VARIABLE: &str = "result";

/// Read-only queries the emitter makes against the allocator's output
pub trait VariableStore {
    /// Look up a variable by name
    fn lookup(&self, name: &str) -> Option<Variable>;

    /// Variables belonging to `subroutine` in allocation order.
    /// `None` selects the variables declared outside any subroutine.
    fn subroutine_variables(&self, subroutine: Option<&str>) -> Vec<Variable>;

    /// The well-known return value slot
    fn result(&self) -> Result<Variable, StoreError> {
        self.lookup(RESULT_VARIABLE)
            .ok_or_else(|| StoreError::unknown_variable(RESULT_VARIABLE))
    }
}

/// One allocated variable as recorded by the allocator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    /// Enclosing subroutine, `None` for top-level variables
    #[serde(default)]
    pub subroutine: Option<String>,
    pub offset: SlotOffset,
    #[serde(default)]
    pub is_pointer: bool,
}

impl VariableEntry {
    pub fn variable(&self) -> Variable {
        Variable { offset: self.offset, is_pointer: self.is_pointer }
    }
}

/// In-memory variable store, ordered by insertion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTable {
    entries: Vec<VariableEntry>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a variable. Later entries with an existing name are kept but
    /// shadowed for `lookup`.
    pub fn insert(&mut self, name: impl Into<String>, subroutine: Option<&str>, variable: Variable) {
        self.entries.push(VariableEntry {
            name: name.into(),
            subroutine: subroutine.map(str::to_string),
            offset: variable.offset,
            is_pointer: variable.is_pointer,
        });
    }

    /// Builder form of [`VariableTable::insert`]
    pub fn with(mut self, name: impl Into<String>, subroutine: Option<&str>, variable: Variable) -> Self {
        self.insert(name, subroutine, variable);
        self
    }

    pub fn entries(&self) -> &[VariableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VariableStore for VariableTable {
    fn lookup(&self, name: &str) -> Option<Variable> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(VariableEntry::variable)
    }

    fn subroutine_variables(&self, subroutine: Option<&str>) -> Vec<Variable> {
        self.entries
            .iter()
            .filter(|entry| entry.subroutine.as_deref() == subroutine)
            .map(VariableEntry::variable)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> VariableTable {
        VariableTable::new()
            .with("result", None, Variable::direct(0))
            .with("x", Some("main"), Variable::direct(1))
            .with("p", Some("main"), Variable::pointer(2))
            .with("y", Some("helper"), Variable::direct(3))
            .with("z", Some("main"), Variable::direct(4))
    }

    #[test]
    fn test_lookup() {
        let table = sample_table();
        assert_eq!(table.lookup("p"), Some(Variable::pointer(2)));
        assert_eq!(table.lookup("missing"), None);
    }

    #[test]
    fn test_lookup_returns_first_entry() {
        let table = sample_table().with("x", Some("helper"), Variable::direct(9));
        assert_eq!(table.lookup("x"), Some(Variable::direct(1)));
    }

    #[test]
    fn test_subroutine_variables_keep_insertion_order() {
        let table = sample_table();
        assert_eq!(
            table.subroutine_variables(Some("main")),
            vec![Variable::direct(1), Variable::pointer(2), Variable::direct(4)]
        );
        assert_eq!(table.subroutine_variables(Some("helper")), vec![Variable::direct(3)]);
        assert_eq!(table.subroutine_variables(None), vec![Variable::direct(0)]);
        assert!(table.subroutine_variables(Some("nowhere")).is_empty());
    }

    #[test]
    fn test_result_lookup() {
        assert_eq!(sample_table().result(), Ok(Variable::direct(0)));
        assert_eq!(
            VariableTable::new().result(),
            Err(StoreError::UnknownVariable { name: "result".to_string() })
        );
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"[
            {"name": "result", "offset": 0},
            {"name": "n", "subroutine": "fib", "offset": 1, "is_pointer": true}
        ]"#;
        let table: VariableTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.subroutine_variables(Some("fib")), vec![Variable::pointer(1)]);
        assert_eq!(table.result(), Ok(Variable::direct(0)));
    }
}

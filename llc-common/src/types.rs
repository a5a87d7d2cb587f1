//! Storage slot types shared by the IR and the emitter
//! 
//! A variable is a reference to a slot, never the value held in it. The
//! allocator decides the offset and whether the slot holds the value itself
//! or an address that must be dereferenced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset of a slot within its storage frame
pub type SlotOffset = u32;

/// A storage slot assigned by the variable allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub offset: SlotOffset,
    /// The slot holds an address to dereference rather than the value
    #[serde(default)]
    pub is_pointer: bool,
}

impl Variable {
    /// A slot that holds its value directly
    pub fn direct(offset: SlotOffset) -> Self {
        Self { offset, is_pointer: false }
    }

    /// A slot that holds the address of its value
    pub fn pointer(offset: SlotOffset) -> Self {
        Self { offset, is_pointer: true }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pointer {
            write!(f, "*[{}]", self.offset)
        } else {
            write!(f, "[{}]", self.offset)
        }
    }
}

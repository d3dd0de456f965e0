//! Target dialect description.
//!
//! Passes that bake in memory-layout assumptions (word size, the well-known
//! free-memory-pointer slot) must check the dialect before touching the AST.

use std::fmt;

use crate::ident::Ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Evm,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evm => write!(f, "evm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub target: Target,
}

impl Dialect {
    /// Size of a machine word in bytes.
    pub const WORD_SIZE: u64 = 32;

    /// Address of the slot holding the free-memory pointer.
    pub const FREE_MEMORY_POINTER: u64 = 64;

    pub fn evm() -> Self {
        Self {
            target: Target::Evm,
        }
    }

    pub fn is_evm(&self) -> bool {
        matches!(self.target, Target::Evm)
    }

    /// The builtin storing one word to linear memory: `mstore(pos, value)`.
    pub fn mem_store_builtin(&self) -> Ident {
        Ident::new_inline("mstore")
    }

    /// The builtin loading one word from linear memory: `mload(pos)`.
    pub fn mem_load_builtin(&self) -> Ident {
        Ident::new_inline("mload")
    }

    pub fn add_builtin(&self) -> Ident {
        Ident::new_inline("add")
    }
}

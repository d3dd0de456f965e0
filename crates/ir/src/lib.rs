pub mod ast;
pub mod dialect;
pub mod ident;
pub mod visitor;
pub mod writer;

pub use ast::{
    Assignment, Block, Call, Expression, For, FunctionDefinition, If, Object, Statement,
    VariableDeclaration,
};
pub use dialect::{Dialect, Target};
pub use ident::{Ident, NameDispenser};
pub use primitive_types::U256;
pub use writer::AstWriter;

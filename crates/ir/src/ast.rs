//! AST node definitions for the arietta IR.
//!
//! The IR is a block-structured, expression-oriented language targeting the
//! EVM: functions take and return named values, statements own their children
//! exclusively, and every node kind is a closed enum variant so that passes
//! dispatching over statements are forced to stay exhaustive.

use primitive_types::U256;

use crate::ident::Ident;

/// A compilation unit: a named object owning an optional code block and zero
/// or more nested sub-objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub name: Ident,
    pub code: Option<Block>,
    pub sub_objects: Vec<Object>,
}

impl Object {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            code: None,
            sub_objects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Block(Block),
    VariableDeclaration(VariableDeclaration),
    Assignment(Assignment),
    /// An expression evaluated for its effects; it must produce no values.
    Expression(Expression),
    FunctionDefinition(FunctionDefinition),
    If(If),
    For(For),
}

/// `let a, b := e1, e2`. Values are evaluated left to right and bound
/// positionally; an empty value list default-initialises every variable to
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub variables: Vec<Ident>,
    pub values: Vec<Expression>,
}

/// `a, b := e1, e2`. Targets must already be declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub targets: Vec<Ident>,
    pub values: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub returns: Vec<Ident>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct For {
    pub init: Block,
    pub condition: Expression,
    pub update: Block,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Literal(U256),
    Identifier(Ident),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub function: Ident,
    pub arguments: Vec<Expression>,
}

impl Expression {
    pub fn literal(value: impl Into<U256>) -> Self {
        Self::Literal(value.into())
    }

    pub fn identifier(name: impl Into<Ident>) -> Self {
        Self::Identifier(name.into())
    }

    pub fn call(function: impl Into<Ident>, arguments: Vec<Expression>) -> Self {
        Self::Call(Call {
            function: function.into(),
            arguments,
        })
    }

    pub fn as_literal(&self) -> Option<U256> {
        match self {
            Self::Literal(value) => Some(*value),
            _ => None,
        }
    }
}

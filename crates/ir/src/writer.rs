//! Canonical text form of the AST.
//!
//! The writer output round-trips through `arietta-parser`, and tests compare
//! pretty-printed text instead of node trees to get readable diffs.

use std::fmt::{self, Write};

use crate::ast::{Block, Expression, Object, Statement};

pub struct AstWriter<'a> {
    object: &'a Object,
}

impl<'a> AstWriter<'a> {
    pub fn new(object: &'a Object) -> Self {
        Self { object }
    }

    pub fn dump_string(&self) -> String {
        let mut out = String::new();
        write_object(&mut out, self.object, 0).expect("writing to a String cannot fail");
        out
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_object(f, self, 0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expression(f, self)
    }
}

/// Renders a block on its own, for tests operating below the object level.
pub fn dump_block(block: &Block) -> String {
    let mut out = String::new();
    write_block(&mut out, block, 0).expect("writing to a String cannot fail");
    out
}

fn write_object(w: &mut impl Write, object: &Object, level: usize) -> fmt::Result {
    indent(w, level)?;
    writeln!(w, "object \"{}\" {{", object.name)?;
    if let Some(code) = &object.code {
        indent(w, level + 1)?;
        write!(w, "code ")?;
        write_block(w, code, level + 1)?;
        writeln!(w)?;
    }
    for sub_object in &object.sub_objects {
        write_object(w, sub_object, level + 1)?;
    }
    indent(w, level)?;
    writeln!(w, "}}")
}

fn write_block(w: &mut impl Write, block: &Block, level: usize) -> fmt::Result {
    if block.statements.is_empty() {
        return write!(w, "{{ }}");
    }
    writeln!(w, "{{")?;
    for statement in &block.statements {
        indent(w, level + 1)?;
        write_statement(w, statement, level + 1)?;
        writeln!(w)?;
    }
    indent(w, level)?;
    write!(w, "}}")
}

fn write_statement(w: &mut impl Write, statement: &Statement, level: usize) -> fmt::Result {
    match statement {
        Statement::Block(block) => write_block(w, block, level),
        Statement::VariableDeclaration(decl) => {
            write!(w, "let ")?;
            write_ident_list(w, &decl.variables)?;
            if !decl.values.is_empty() {
                write!(w, " := ")?;
                write_expression_list(w, &decl.values)?;
            }
            Ok(())
        }
        Statement::Assignment(assignment) => {
            write_ident_list(w, &assignment.targets)?;
            write!(w, " := ")?;
            write_expression_list(w, &assignment.values)
        }
        Statement::Expression(expression) => write_expression(w, expression),
        Statement::FunctionDefinition(def) => {
            write!(w, "function {}(", def.name)?;
            write_ident_list(w, &def.parameters)?;
            write!(w, ")")?;
            if !def.returns.is_empty() {
                write!(w, " -> ")?;
                write_ident_list(w, &def.returns)?;
            }
            write!(w, " ")?;
            write_block(w, &def.body, level)
        }
        Statement::If(if_stmt) => {
            write!(w, "if ")?;
            write_expression(w, &if_stmt.condition)?;
            write!(w, " ")?;
            write_block(w, &if_stmt.body, level)
        }
        Statement::For(for_stmt) => {
            write!(w, "for ")?;
            write_block(w, &for_stmt.init, level)?;
            write!(w, " ")?;
            write_expression(w, &for_stmt.condition)?;
            write!(w, " ")?;
            write_block(w, &for_stmt.update, level)?;
            write!(w, " ")?;
            write_block(w, &for_stmt.body, level)
        }
    }
}

fn write_expression(w: &mut impl Write, expression: &Expression) -> fmt::Result {
    match expression {
        Expression::Literal(value) => write!(w, "{value}"),
        Expression::Identifier(name) => write!(w, "{name}"),
        Expression::Call(call) => {
            write!(w, "{}(", call.function)?;
            write_expression_list(w, &call.arguments)?;
            write!(w, ")")
        }
    }
}

fn write_ident_list(w: &mut impl Write, names: &[crate::ident::Ident]) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i != 0 {
            write!(w, ", ")?;
        }
        write!(w, "{name}")?;
    }
    Ok(())
}

fn write_expression_list(w: &mut impl Write, expressions: &[Expression]) -> fmt::Result {
    for (i, expression) in expressions.iter().enumerate() {
        if i != 0 {
            write!(w, ", ")?;
        }
        write_expression(w, expression)?;
    }
    Ok(())
}

fn indent(w: &mut impl Write, level: usize) -> fmt::Result {
    for _ in 0..level {
        write!(w, "    ")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDefinition, VariableDeclaration};
    use crate::ident::Ident;

    #[test]
    fn writes_nested_structure() {
        let mut object = Object::new("unit");
        object.code = Some(Block {
            statements: vec![
                Statement::Block(Block {
                    statements: vec![Statement::Expression(Expression::call(
                        "mstore",
                        vec![Expression::literal(64u64), Expression::literal(128u64)],
                    ))],
                }),
                Statement::FunctionDefinition(FunctionDefinition {
                    name: Ident::from("f"),
                    parameters: vec![],
                    returns: vec![Ident::from("r")],
                    body: Block {
                        statements: vec![Statement::VariableDeclaration(VariableDeclaration {
                            variables: vec![Ident::from("x")],
                            values: vec![],
                        })],
                    },
                }),
            ],
        });

        let expected = r#"object "unit" {
    code {
        {
            mstore(64, 128)
        }
        function f() -> r {
            let x
        }
    }
}
"#;
        assert_eq!(AstWriter::new(&object).dump_string(), expected);
    }

    #[test]
    fn writes_empty_blocks_inline() {
        let block = Block::default();
        assert_eq!(dump_block(&block), "{ }");
    }
}

//! In-place AST traversal.
//!
//! [`AstModifier`] is a mutable walker: each method has a default body that
//! delegates to the matching `walk_*` free function, so an implementation
//! overrides only the node kinds it cares about and calls `walk_*` to descend
//! into the rest. [`replace_statements`] is the companion helper for passes
//! that rewrite one statement into several.

use smallvec::SmallVec;

use crate::ast::{
    Assignment, Block, Call, Expression, For, FunctionDefinition, If, Object, Statement,
    VariableDeclaration,
};

pub trait AstModifier {
    fn visit_object(&mut self, object: &mut Object) {
        walk_object(self, object)
    }

    fn visit_block(&mut self, block: &mut Block) {
        walk_block(self, block)
    }

    fn visit_stmt(&mut self, statement: &mut Statement) {
        walk_stmt(self, statement)
    }

    fn visit_variable_declaration(&mut self, decl: &mut VariableDeclaration) {
        walk_variable_declaration(self, decl)
    }

    fn visit_assignment(&mut self, assignment: &mut Assignment) {
        walk_assignment(self, assignment)
    }

    fn visit_function_definition(&mut self, def: &mut FunctionDefinition) {
        walk_function_definition(self, def)
    }

    fn visit_if(&mut self, if_stmt: &mut If) {
        walk_if(self, if_stmt)
    }

    fn visit_for(&mut self, for_stmt: &mut For) {
        walk_for(self, for_stmt)
    }

    fn visit_expr(&mut self, expression: &mut Expression) {
        walk_expr(self, expression)
    }

    fn visit_call(&mut self, call: &mut Call) {
        walk_call(self, call)
    }
}

pub fn walk_object<V: AstModifier + ?Sized>(visitor: &mut V, object: &mut Object) {
    if let Some(code) = &mut object.code {
        visitor.visit_block(code);
    }
    for sub_object in &mut object.sub_objects {
        visitor.visit_object(sub_object);
    }
}

pub fn walk_block<V: AstModifier + ?Sized>(visitor: &mut V, block: &mut Block) {
    for statement in &mut block.statements {
        visitor.visit_stmt(statement);
    }
}

pub fn walk_stmt<V: AstModifier + ?Sized>(visitor: &mut V, statement: &mut Statement) {
    match statement {
        Statement::Block(block) => visitor.visit_block(block),
        Statement::VariableDeclaration(decl) => visitor.visit_variable_declaration(decl),
        Statement::Assignment(assignment) => visitor.visit_assignment(assignment),
        Statement::Expression(expression) => visitor.visit_expr(expression),
        Statement::FunctionDefinition(def) => visitor.visit_function_definition(def),
        Statement::If(if_stmt) => visitor.visit_if(if_stmt),
        Statement::For(for_stmt) => visitor.visit_for(for_stmt),
    }
}

pub fn walk_variable_declaration<V: AstModifier + ?Sized>(
    visitor: &mut V,
    decl: &mut VariableDeclaration,
) {
    for value in &mut decl.values {
        visitor.visit_expr(value);
    }
}

pub fn walk_assignment<V: AstModifier + ?Sized>(visitor: &mut V, assignment: &mut Assignment) {
    for value in &mut assignment.values {
        visitor.visit_expr(value);
    }
}

pub fn walk_function_definition<V: AstModifier + ?Sized>(
    visitor: &mut V,
    def: &mut FunctionDefinition,
) {
    visitor.visit_block(&mut def.body);
}

pub fn walk_if<V: AstModifier + ?Sized>(visitor: &mut V, if_stmt: &mut If) {
    visitor.visit_expr(&mut if_stmt.condition);
    visitor.visit_block(&mut if_stmt.body);
}

pub fn walk_for<V: AstModifier + ?Sized>(visitor: &mut V, for_stmt: &mut For) {
    visitor.visit_block(&mut for_stmt.init);
    visitor.visit_expr(&mut for_stmt.condition);
    visitor.visit_block(&mut for_stmt.update);
    visitor.visit_block(&mut for_stmt.body);
}

pub fn walk_expr<V: AstModifier + ?Sized>(visitor: &mut V, expression: &mut Expression) {
    match expression {
        Expression::Literal(_) | Expression::Identifier(_) => {}
        Expression::Call(call) => visitor.visit_call(call),
    }
}

pub fn walk_call<V: AstModifier + ?Sized>(visitor: &mut V, call: &mut Call) {
    for argument in &mut call.arguments {
        visitor.visit_expr(argument);
    }
}

/// Rebuilds a statement list by mapping each statement to zero or more
/// replacements. The inline capacity of one keeps the common keep-as-is case
/// allocation free.
pub fn replace_statements<const N: usize>(
    statements: &mut Vec<Statement>,
    mut f: impl FnMut(Statement) -> SmallVec<[Statement; N]>,
) {
    let old = std::mem::take(statements);
    statements.reserve(old.len());
    for statement in old {
        statements.extend(f(statement));
    }
}

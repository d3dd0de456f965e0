//! Identifiers and the [`NameDispenser`].

use rustc_hash::FxHashSet;
use smol_str::{format_smolstr, SmolStr};

use crate::ast::{Block, Expression, Object, Statement};

/// An interned-ish identifier. `SmolStr` keeps short names inline and clones
/// in O(1), which suits an AST that is cloned and rewritten a lot.
pub type Ident = SmolStr;

/// Hands out names that are guaranteed unused within a compilation unit.
///
/// Seed it from the unit with [`NameDispenser::new`] before running any pass
/// that introduces fresh variables; every dispensed name is recorded so later
/// requests never collide with earlier ones.
#[derive(Debug, Default)]
pub struct NameDispenser {
    used: FxHashSet<Ident>,
}

impl NameDispenser {
    /// Seeds the dispenser with every name occurring anywhere in `object`,
    /// including its sub-objects.
    pub fn new(object: &Object) -> Self {
        let mut used = FxHashSet::default();
        collect_object_names(object, &mut used);
        Self { used }
    }

    pub fn with_used(names: impl IntoIterator<Item = Ident>) -> Self {
        Self {
            used: names.into_iter().collect(),
        }
    }

    /// Returns `hint` if it is unused, otherwise `hint_1`, `hint_2`, ... and
    /// marks the returned name as used.
    pub fn new_name(&mut self, hint: &str) -> Ident {
        let mut candidate = Ident::from(hint);
        let mut suffix = 0u32;
        while self.used.contains(&candidate) {
            suffix += 1;
            candidate = format_smolstr!("{hint}_{suffix}");
        }
        self.used.insert(candidate.clone());
        candidate
    }

    pub fn mark_used(&mut self, name: Ident) {
        self.used.insert(name);
    }
}

fn collect_object_names(object: &Object, used: &mut FxHashSet<Ident>) {
    used.insert(object.name.clone());
    if let Some(code) = &object.code {
        collect_block_names(code, used);
    }
    for sub_object in &object.sub_objects {
        collect_object_names(sub_object, used);
    }
}

fn collect_block_names(block: &Block, used: &mut FxHashSet<Ident>) {
    for statement in &block.statements {
        match statement {
            Statement::Block(block) => collect_block_names(block, used),
            Statement::VariableDeclaration(decl) => {
                used.extend(decl.variables.iter().cloned());
                for value in &decl.values {
                    collect_expression_names(value, used);
                }
            }
            Statement::Assignment(assignment) => {
                used.extend(assignment.targets.iter().cloned());
                for value in &assignment.values {
                    collect_expression_names(value, used);
                }
            }
            Statement::Expression(expression) => collect_expression_names(expression, used),
            Statement::FunctionDefinition(def) => {
                used.insert(def.name.clone());
                used.extend(def.parameters.iter().cloned());
                used.extend(def.returns.iter().cloned());
                collect_block_names(&def.body, used);
            }
            Statement::If(if_stmt) => {
                collect_expression_names(&if_stmt.condition, used);
                collect_block_names(&if_stmt.body, used);
            }
            Statement::For(for_stmt) => {
                collect_block_names(&for_stmt.init, used);
                collect_expression_names(&for_stmt.condition, used);
                collect_block_names(&for_stmt.update, used);
                collect_block_names(&for_stmt.body, used);
            }
        }
    }
}

fn collect_expression_names(expression: &Expression, used: &mut FxHashSet<Ident>) {
    match expression {
        Expression::Literal(_) => {}
        Expression::Identifier(name) => {
            used.insert(name.clone());
        }
        Expression::Call(call) => {
            used.insert(call.function.clone());
            for argument in &call.arguments {
                collect_expression_names(argument, used);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDefinition, VariableDeclaration};

    #[test]
    fn dispenses_unused_hint_directly() {
        let mut dispenser = NameDispenser::with_used([Ident::from("a")]);
        assert_eq!(dispenser.new_name("b"), "b");
    }

    #[test]
    fn dispenses_suffixed_names_on_collision() {
        let mut dispenser = NameDispenser::with_used([Ident::from("x"), Ident::from("x_1")]);
        assert_eq!(dispenser.new_name("x"), "x_2");
        // The dispensed name itself is now taken.
        assert_eq!(dispenser.new_name("x"), "x_3");
    }

    #[test]
    fn seeds_from_object() {
        let mut object = Object::new("unit");
        let mut code = Block::default();
        code.statements
            .push(Statement::FunctionDefinition(FunctionDefinition {
                name: Ident::from("f"),
                parameters: vec![Ident::from("p")],
                returns: vec![],
                body: Block {
                    statements: vec![Statement::VariableDeclaration(VariableDeclaration {
                        variables: vec![Ident::from("v")],
                        values: vec![Expression::identifier("p")],
                    })],
                },
            }));
        object.code = Some(code);

        let mut dispenser = NameDispenser::new(&object);
        assert_eq!(dispenser.new_name("v"), "v_1");
        assert_eq!(dispenser.new_name("fresh"), "fresh");
    }
}

//! Stack-depth checking.
//!
//! The escalation pass does not decide for itself which variables overflow
//! the stack; it consumes the verdict of a [`StackDepthChecker`]. The checker
//! used in production is expected to simulate the backend's stack layout;
//! [`ReachLimitChecker`] is a deliberately naive stand-in that counts
//! simultaneously addressable names against the EVM's dup/swap reach.

use indexmap::IndexMap;
use ir::{Block, Dialect, FunctionDefinition, Ident, Object, Statement};

/// Per function, the local variables that must leave the evaluation stack,
/// in declaration order. Functions that compile fine are absent.
pub type StackCheckResult = IndexMap<Ident, Vec<Ident>>;

pub trait StackDepthChecker {
    fn check(
        &self,
        object: &Object,
        dialect: &Dialect,
        optimize_stack_allocation: bool,
    ) -> StackCheckResult;
}

impl<F> StackDepthChecker for F
where
    F: Fn(&Object, &Dialect, bool) -> StackCheckResult,
{
    fn check(
        &self,
        object: &Object,
        dialect: &Dialect,
        optimize_stack_allocation: bool,
    ) -> StackCheckResult {
        self(object, dialect, optimize_stack_allocation)
    }
}

/// Reports, per function, every local declared after the dup/swap reach is
/// exhausted by parameters, return variables and earlier locals. Parameters
/// and return variables themselves are never reported; they cannot be moved
/// off the stack.
#[derive(Debug, Clone, Copy)]
pub struct ReachLimitChecker {
    pub reach: usize,
}

impl Default for ReachLimitChecker {
    fn default() -> Self {
        // EVM DUP16/SWAP16.
        Self { reach: 16 }
    }
}

impl StackDepthChecker for ReachLimitChecker {
    fn check(
        &self,
        object: &Object,
        _dialect: &Dialect,
        _optimize_stack_allocation: bool,
    ) -> StackCheckResult {
        let mut result = StackCheckResult::default();
        if let Some(code) = &object.code {
            check_block(code, self.reach, &mut result);
        }
        result
    }
}

fn check_block(block: &Block, reach: usize, result: &mut StackCheckResult) {
    for statement in &block.statements {
        match statement {
            Statement::FunctionDefinition(def) => check_function(def, reach, result),
            Statement::Block(inner) => check_block(inner, reach, result),
            Statement::If(if_stmt) => check_block(&if_stmt.body, reach, result),
            Statement::For(for_stmt) => {
                check_block(&for_stmt.init, reach, result);
                check_block(&for_stmt.update, reach, result);
                check_block(&for_stmt.body, reach, result);
            }
            _ => {}
        }
    }
}

fn check_function(def: &FunctionDefinition, reach: usize, result: &mut StackCheckResult) {
    let mut locals = Vec::new();
    collect_locals(&def.body, reach, result, &mut locals);

    let budget = reach.saturating_sub(def.parameters.len() + def.returns.len());
    if locals.len() > budget {
        result.insert(def.name.clone(), locals.split_off(budget));
    }
}

/// Gathers locals in declaration order; nested function definitions are
/// checked on their own and do not count against the enclosing function.
fn collect_locals(
    block: &Block,
    reach: usize,
    result: &mut StackCheckResult,
    locals: &mut Vec<Ident>,
) {
    for statement in &block.statements {
        match statement {
            Statement::VariableDeclaration(decl) => {
                locals.extend(decl.variables.iter().cloned());
            }
            Statement::Block(inner) => collect_locals(inner, reach, result, locals),
            Statement::If(if_stmt) => collect_locals(&if_stmt.body, reach, result, locals),
            Statement::For(for_stmt) => {
                collect_locals(&for_stmt.init, reach, result, locals);
                collect_locals(&for_stmt.update, reach, result, locals);
                collect_locals(&for_stmt.body, reach, result, locals);
            }
            Statement::FunctionDefinition(def) => check_function(def, reach, result),
            Statement::Assignment(_) | Statement::Expression(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str, reach: usize) -> StackCheckResult {
        let object = arietta_parser::parse_object(source).unwrap();
        ReachLimitChecker { reach }.check(&object, &Dialect::evm(), true)
    }

    #[test]
    fn reports_locals_beyond_reach() {
        let result = check(
            r#"object "unit" {
                code {
                    function f() {
                        let a := 1
                        let b := 2
                        let c := 3
                    }
                }
            }"#,
            2,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[&Ident::from("f")], vec![Ident::from("c")]);
    }

    #[test]
    fn parameters_consume_reach_but_are_not_reported() {
        let result = check(
            r#"object "unit" {
                code {
                    function f(p, q) -> r {
                        let a := 1
                        let b := 2
                    }
                }
            }"#,
            4,
        );
        assert_eq!(result[&Ident::from("f")], vec![Ident::from("b")]);
    }

    #[test]
    fn compilable_functions_are_absent() {
        let result = check(
            r#"object "unit" {
                code {
                    function f() {
                        let a := 1
                    }
                }
            }"#,
            16,
        );
        assert!(result.is_empty());
    }
}

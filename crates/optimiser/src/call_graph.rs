//! Direct call graph of a code block.
//!
//! Edges are direct (non-transitive) calls only, keyed by function name.
//! Calls made by top-level code outside any function are attributed to the
//! synthetic root, the empty identifier. Builtin calls are recorded like any
//! other callee; consumers that only care about defined functions treat names
//! without a graph entry as leaves.

use indexmap::{IndexMap, IndexSet};
use ir::{Block, Call, Expression, Ident, Statement};

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    edges: IndexMap<Ident, IndexSet<Ident>>,
}

impl CallGraph {
    /// The synthetic caller representing top-level code.
    pub fn root() -> Ident {
        Ident::default()
    }

    pub fn build(code: &Block) -> Self {
        let mut graph = Self::default();
        graph.edges.entry(Self::root()).or_default();
        graph.collect_block(code, &Self::root());
        graph
    }

    /// Direct callees of `function`, in first-call order. `None` for names
    /// that define no function in the unit (builtins, externals).
    pub fn callees(&self, function: &Ident) -> Option<&IndexSet<Ident>> {
        self.edges.get(function)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Ident> {
        self.edges.keys()
    }

    fn collect_block(&mut self, block: &Block, caller: &Ident) {
        for statement in &block.statements {
            self.collect_statement(statement, caller);
        }
    }

    fn collect_statement(&mut self, statement: &Statement, caller: &Ident) {
        match statement {
            Statement::Block(block) => self.collect_block(block, caller),
            Statement::VariableDeclaration(decl) => {
                for value in &decl.values {
                    self.collect_expression(value, caller);
                }
            }
            Statement::Assignment(assignment) => {
                for value in &assignment.values {
                    self.collect_expression(value, caller);
                }
            }
            Statement::Expression(expression) => self.collect_expression(expression, caller),
            Statement::FunctionDefinition(def) => {
                self.edges.entry(def.name.clone()).or_default();
                self.collect_block(&def.body, &def.name);
            }
            Statement::If(if_stmt) => {
                self.collect_expression(&if_stmt.condition, caller);
                self.collect_block(&if_stmt.body, caller);
            }
            Statement::For(for_stmt) => {
                self.collect_block(&for_stmt.init, caller);
                self.collect_expression(&for_stmt.condition, caller);
                self.collect_block(&for_stmt.update, caller);
                self.collect_block(&for_stmt.body, caller);
            }
        }
    }

    fn collect_expression(&mut self, expression: &Expression, caller: &Ident) {
        match expression {
            Expression::Literal(_) | Expression::Identifier(_) => {}
            Expression::Call(Call {
                function,
                arguments,
            }) => {
                self.edges
                    .entry(caller.clone())
                    .or_default()
                    .insert(function.clone());
                for argument in arguments {
                    self.collect_expression(argument, caller);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callee_names(graph: &CallGraph, function: &str) -> Vec<String> {
        graph
            .callees(&Ident::from(function))
            .map(|callees| callees.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn collects_direct_calls_per_function() {
        let block = arietta_parser::parse_block(
            r#"{
                f()
                function f() {
                    g(h(1))
                }
                function g(v) { }
                function h(v) -> w {
                    w := v
                }
            }"#,
        )
        .unwrap();
        let graph = CallGraph::build(&block);

        assert_eq!(callee_names(&graph, ""), vec!["f"]);
        // Nested call arguments count as calls of the enclosing function,
        // not of the callee receiving the result.
        assert_eq!(callee_names(&graph, "f"), vec!["g", "h"]);
        assert!(callee_names(&graph, "g").is_empty());
        assert!(callee_names(&graph, "h").is_empty());
    }

    #[test]
    fn records_builtin_callees() {
        let block = arietta_parser::parse_block(
            r#"{
                function f() {
                    mstore(0, 1)
                }
            }"#,
        )
        .unwrap();
        let graph = CallGraph::build(&block);

        assert_eq!(callee_names(&graph, "f"), vec!["mstore"]);
        // Builtins define no function, so they have no graph entry.
        assert!(graph.callees(&Ident::from("mstore")).is_none());
    }

    #[test]
    fn attributes_calls_in_control_flow_to_enclosing_function() {
        let block = arietta_parser::parse_block(
            r#"{
                function f(c) {
                    if c {
                        g()
                    }
                    for { } c { } {
                        h()
                    }
                }
                function g() { }
                function h() { }
            }"#,
        )
        .unwrap();
        let graph = CallGraph::build(&block);
        assert_eq!(callee_names(&graph, "f"), vec!["g", "h"]);
    }
}

//! Escalates local variables into reserved linear memory to eliminate
//! "stack too deep" failures.
//!
//! The pass asks a [`StackDepthChecker`] which variables in which functions
//! must leave the evaluation stack, reserves one 32-byte memory slot per
//! escalated variable, and rewrites every declaration, assignment and read of
//! those variables into `mstore`/`mload` operations against a fixed address.
//!
//! Slot indices are assigned bottom-up over the call graph. Within one active
//! call chain a function's slots never overlap a callee's, but sibling call
//! subtrees are never simultaneously active, so their slot ranges are merged
//! with `max` rather than summed. That reuse is what bounds the total amount
//! of memory the pass reserves.
//!
//! Prerequisites: the unit's code must start with the canonical free-memory
//! initialisation (`mstore(64, <literal>)` as the first statement of the
//! first block) and the call graph must be acyclic. When either does not
//! hold the pass leaves the unit untouched; neither is an error.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use ir::{
    ast::{Assignment, Block, Call, Expression, Object, Statement, VariableDeclaration},
    visitor::{replace_statements, walk_block, walk_expr, walk_function_definition, AstModifier},
    Dialect, FunctionDefinition, Ident, NameDispenser, U256,
};
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::{
    call_graph::CallGraph,
    stack_check::{StackCheckResult, StackDepthChecker},
};

/// Services shared by all optimiser steps operating on one unit.
pub struct EscalatorContext<'a> {
    pub dialect: &'a Dialect,
    pub dispenser: &'a mut NameDispenser,
}

/// Slot index per escalated variable of one function, in checker order.
pub type SlotMap = IndexMap<Ident, u64>;

pub struct MemoryEscalator;

impl MemoryEscalator {
    /// Runs the pass over `object`, mutating it in place.
    ///
    /// Panics if `ctx.dialect` is not an EVM dialect; the memory layout this
    /// pass assumes (word size, free-pointer slot) is EVM-specific and
    /// calling it for another target is a caller bug, not a recoverable
    /// condition.
    pub fn run(
        ctx: &mut EscalatorContext,
        object: &mut Object,
        checker: &dyn StackDepthChecker,
        optimize_stack_allocation: bool,
    ) {
        let stack_errors = checker.check(object, ctx.dialect, optimize_stack_allocation);
        if stack_errors.is_empty() {
            return;
        }

        assert!(
            ctx.dialect.is_evm(),
            "MemoryEscalator can only be run on EVM dialect objects"
        );

        let Some(code) = object.code.as_mut() else {
            return;
        };
        let Some(reserved) = reserved_memory(code, ctx.dialect) else {
            return;
        };

        let call_graph = CallGraph::build(code);
        let Some(assignment) = assign_memory_slots(&call_graph, &stack_errors) else {
            // Recursion: per-activation memory cannot be bounded statically.
            return;
        };
        if assignment.slots.is_empty() {
            return;
        }

        grow_reserved_memory(code, ctx.dialect, assignment.total_slots);
        let mut escalator =
            VariableEscalator::new(&assignment.slots, reserved, ctx.dialect, ctx.dispenser);
        escalator.visit_block(code);
    }
}

/// Locates the canonical free-memory initialisation: the first statement of
/// the code's first block must be `mstore(64, <reserved size>)`. This is a
/// structural match only; it does not reason about control flow in front of
/// the pattern.
fn memory_init<'a>(code: &'a Block, dialect: &Dialect) -> Option<&'a Call> {
    let Statement::Block(block) = code.statements.first()? else {
        return None;
    };
    let Statement::Expression(Expression::Call(call)) = block.statements.first()? else {
        return None;
    };
    is_memory_init(call, dialect).then_some(call)
}

fn memory_init_mut<'a>(code: &'a mut Block, dialect: &Dialect) -> Option<&'a mut Call> {
    let Statement::Block(block) = code.statements.first_mut()? else {
        return None;
    };
    let Statement::Expression(Expression::Call(call)) = block.statements.first_mut()? else {
        return None;
    };
    is_memory_init(call, dialect).then_some(call)
}

fn is_memory_init(call: &Call, dialect: &Dialect) -> bool {
    call.function == dialect.mem_store_builtin()
        && call.arguments.len() == 2
        && call.arguments[0].as_literal() == Some(U256::from(Dialect::FREE_MEMORY_POINTER))
}

/// The reserved size operand of the canonical pattern, if it is a literal.
fn reserved_memory(code: &Block, dialect: &Dialect) -> Option<U256> {
    memory_init(code, dialect)?.arguments[1].as_literal()
}

/// Rewrites the reserved size operand to `add(<old>, 32 * total_slots)`.
fn grow_reserved_memory(code: &mut Block, dialect: &Dialect, total_slots: u64) {
    let Some(call) = memory_init_mut(code, dialect) else {
        return;
    };
    let old = std::mem::replace(&mut call.arguments[1], Expression::Literal(U256::zero()));
    let growth = U256::from(Dialect::WORD_SIZE) * U256::from(total_slots);
    call.arguments[1] = Expression::call(
        dialect.add_builtin(),
        vec![old, Expression::Literal(growth)],
    );
}

struct SlotAssignment {
    slots: IndexMap<Ident, SlotMap>,
    total_slots: u64,
}

/// Assigns slot indices bottom-up over the call graph.
///
/// Functions are processed in reverse topological order (Kahn's algorithm on
/// pending-callee counts), so every callee's slot budget is final before any
/// of its callers is considered. A function's own variables are placed above
/// `max` of its callees' budgets: its locals must stay valid across any call,
/// while sibling subtrees may reuse each other's range.
///
/// Returns `None` when the subgraph reachable from the root contains a cycle.
fn assign_memory_slots(
    call_graph: &CallGraph,
    stack_errors: &StackCheckResult,
) -> Option<SlotAssignment> {
    let root = CallGraph::root();

    // Breadth-first over the reachable subgraph: reverse edges plus, per
    // function, the number of distinct callees still awaiting finalisation.
    let mut reachable: IndexSet<Ident> = IndexSet::new();
    let mut callers: FxHashMap<Ident, IndexSet<Ident>> = FxHashMap::default();
    let mut pending: FxHashMap<Ident, usize> = FxHashMap::default();
    let mut worklist: VecDeque<Ident> = VecDeque::from([root.clone()]);
    reachable.insert(root.clone());
    while let Some(function) = worklist.pop_front() {
        let Some(callees) = call_graph.callees(&function).filter(|c| !c.is_empty()) else {
            continue;
        };
        pending.insert(function.clone(), callees.len());
        for callee in callees {
            callers
                .entry(callee.clone())
                .or_default()
                .insert(function.clone());
            if reachable.insert(callee.clone()) {
                worklist.push_back(callee.clone());
            }
        }
    }

    let mut next_available: FxHashMap<Ident, u64> = FxHashMap::default();
    let mut slots: IndexMap<Ident, SlotMap> = IndexMap::new();
    let mut finalized = 0usize;
    let mut ready: VecDeque<Ident> = reachable
        .iter()
        .filter(|function| !pending.contains_key(*function))
        .cloned()
        .collect();

    while let Some(function) = ready.pop_front() {
        finalized += 1;

        let mut n = 0u64;
        if let Some(callees) = call_graph.callees(&function) {
            for callee in callees {
                n = n.max(next_available.get(callee).copied().unwrap_or(0));
            }
        }
        if let Some(variables) = stack_errors.get(&function) {
            let mut assigned = SlotMap::default();
            for variable in variables {
                assigned.insert(variable.clone(), n);
                n += 1;
            }
            slots.insert(function.clone(), assigned);
        }
        next_available.insert(function.clone(), n);

        if let Some(function_callers) = callers.get(&function) {
            for caller in function_callers {
                let Some(count) = pending.get_mut(caller) else {
                    continue;
                };
                *count -= 1;
                if *count == 0 {
                    ready.push_back(caller.clone());
                }
            }
        }
    }

    // Leftover functions sit on a directed cycle.
    if finalized != reachable.len() {
        return None;
    }

    let total_slots = next_available.get(&root).copied().unwrap_or(0);
    Some(SlotAssignment { slots, total_slots })
}

/// Rewrites accesses to escalated variables into memory operations.
///
/// Fresh stack temporaries bridge multi-value statements: each right-hand
/// value is still produced in its original position, bound to a temporary
/// where the original target has moved to memory, and copied out afterwards,
/// so evaluation order and positional semantics are preserved.
struct VariableEscalator<'a> {
    memory_slots: &'a IndexMap<Ident, SlotMap>,
    reserved: U256,
    dialect: &'a Dialect,
    dispenser: &'a mut NameDispenser,
    current: Option<&'a SlotMap>,
}

impl<'a> VariableEscalator<'a> {
    fn new(
        memory_slots: &'a IndexMap<Ident, SlotMap>,
        reserved: U256,
        dialect: &'a Dialect,
        dispenser: &'a mut NameDispenser,
    ) -> Self {
        Self {
            memory_slots,
            reserved,
            dialect,
            dispenser,
            current: None,
        }
    }

    fn memory_location(&self, slot: u64) -> Expression {
        Expression::Literal(self.reserved + U256::from(Dialect::WORD_SIZE) * U256::from(slot))
    }

    fn slot_of(&self, name: &Ident) -> Option<u64> {
        self.current.and_then(|slots| slots.get(name).copied())
    }

    fn needs_escalation(&self, names: &[Ident]) -> bool {
        names.iter().any(|name| self.slot_of(name).is_some())
    }

    fn store(&self, slot: u64, value: Expression) -> Statement {
        Statement::Expression(Expression::call(
            self.dialect.mem_store_builtin(),
            vec![self.memory_location(slot), value],
        ))
    }

    fn append_stores(&self, result: &mut SmallVec<[Statement; 3]>, stores: Vec<(u64, Ident)>) {
        for (slot, name) in stores {
            result.push(self.store(slot, Expression::Identifier(name)));
        }
    }

    fn rewrite_statement(&mut self, statement: Statement) -> SmallVec<[Statement; 3]> {
        match statement {
            Statement::Assignment(assignment) if self.needs_escalation(&assignment.targets) => {
                self.rewrite_assignment(assignment)
            }
            Statement::VariableDeclaration(decl) if self.needs_escalation(&decl.variables) => {
                self.rewrite_declaration(decl)
            }
            mut other => {
                self.visit_stmt(&mut other);
                smallvec![other]
            }
        }
    }

    fn rewrite_assignment(&mut self, mut assignment: Assignment) -> SmallVec<[Statement; 3]> {
        for value in &mut assignment.values {
            self.visit_expr(value);
        }

        if assignment.targets.len() == 1 {
            if let Some(slot) = self.slot_of(&assignment.targets[0]) {
                let value = assignment
                    .values
                    .pop()
                    .unwrap_or_else(|| Expression::Literal(U256::zero()));
                return smallvec![self.store(slot, value)];
            }
        }

        // Escalated targets are redirected into fresh stack temporaries so
        // the assignment still binds every value in its original position;
        // the temporaries are copied to memory afterwards.
        let mut temporaries = VariableDeclaration::default();
        let mut stores = Vec::new();
        for target in &mut assignment.targets {
            if let Some(slot) = self.slot_of(target) {
                let fresh = self.dispenser.new_name(target);
                temporaries.variables.push(fresh.clone());
                stores.push((slot, fresh.clone()));
                *target = fresh;
            }
        }
        let mut result: SmallVec<[Statement; 3]> = smallvec![
            Statement::VariableDeclaration(temporaries),
            Statement::Assignment(assignment),
        ];
        self.append_stores(&mut result, stores);
        result
    }

    fn rewrite_declaration(&mut self, mut decl: VariableDeclaration) -> SmallVec<[Statement; 3]> {
        for value in &mut decl.values {
            self.visit_expr(value);
        }

        if decl.variables.len() == 1 {
            if let Some(slot) = self.slot_of(&decl.variables[0]) {
                let value = decl
                    .values
                    .pop()
                    .unwrap_or_else(|| Expression::Literal(U256::zero()));
                return smallvec![self.store(slot, value)];
            }
        }

        // The declaration keeps producing values positionally; escalated
        // variables are renamed in place and copied to memory afterwards.
        let mut stores = Vec::new();
        for variable in &mut decl.variables {
            if let Some(slot) = self.slot_of(variable) {
                let fresh = self.dispenser.new_name(variable);
                stores.push((slot, fresh.clone()));
                *variable = fresh;
            }
        }
        let mut result: SmallVec<[Statement; 3]> =
            smallvec![Statement::VariableDeclaration(decl)];
        self.append_stores(&mut result, stores);
        result
    }
}

impl AstModifier for VariableEscalator<'_> {
    fn visit_function_definition(&mut self, def: &mut FunctionDefinition) {
        let saved = self.current;
        self.current = self.memory_slots.get(&def.name).and_then(|slots| {
            let unsupported = def
                .parameters
                .iter()
                .chain(&def.returns)
                .any(|name| slots.contains_key(name));
            // Escalating parameters or return variables is unsupported;
            // leave the whole function on the stack.
            (!unsupported).then_some(slots)
        });
        walk_function_definition(self, def);
        self.current = saved;
    }

    fn visit_block(&mut self, block: &mut Block) {
        if self.current.is_none() {
            walk_block(self, block);
            return;
        }
        replace_statements(&mut block.statements, |statement| {
            self.rewrite_statement(statement)
        });
    }

    fn visit_expr(&mut self, expression: &mut Expression) {
        if let Expression::Identifier(name) = expression {
            if let Some(slot) = self.slot_of(name) {
                *expression = Expression::call(
                    self.dialect.mem_load_builtin(),
                    vec![self.memory_location(slot)],
                );
                return;
            }
        }
        walk_expr(self, expression);
    }
}

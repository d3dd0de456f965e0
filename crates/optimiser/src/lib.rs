//! Optimisation passes and module-level analyses for the arietta middle-end.

pub mod call_graph;
pub mod memory_escalator;
pub mod stack_check;

pub use call_graph::CallGraph;
pub use memory_escalator::{EscalatorContext, MemoryEscalator};
pub use stack_check::{ReachLimitChecker, StackCheckResult, StackDepthChecker};

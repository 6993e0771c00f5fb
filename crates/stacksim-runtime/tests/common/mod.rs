//! Shared test utilities for stacksim integration tests

#![allow(dead_code)]

use stacksim_runtime::{MemoryConsole, Runtime, StackSimulator, TickMode};

// Re-export testing utilities
#[allow(unused_imports)]
pub use pretty_assertions::{assert_eq, assert_ne};

/// Install a test-writer subscriber so `RUST_LOG`-style output shows up
/// under `cargo test -- --nocapture`; repeated calls are harmless
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Runtime recording console output in memory
pub fn recording_runtime() -> (Runtime, MemoryConsole) {
    init_tracing();
    let console = MemoryConsole::new();
    (Runtime::with_console(console.clone()), console)
}

/// Same as [`recording_runtime`] with a custom depth limit and tick mode
pub fn recording_runtime_with(max_depth: usize, mode: TickMode) -> (Runtime, MemoryConsole) {
    let (rt, console) = recording_runtime();
    (rt.with_max_depth(max_depth).with_tick_mode(mode), console)
}

/// Stack pre-filled with `names`, bottom first
pub fn stack_with(names: &[&str]) -> StackSimulator {
    let mut stack = StackSimulator::new();
    for name in names {
        stack.push(*name).expect("test stack within limit");
    }
    stack
}

/// Collect the current trace into owned strings
pub fn trace_of(stack: &StackSimulator) -> Vec<String> {
    stack.trace().map(str::to_owned).collect()
}

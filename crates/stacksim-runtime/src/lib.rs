//! stacksim Runtime - call-stack execution model
//!
//! This library models how a single-threaded scripting runtime executes code:
//! - A bounded LIFO call stack with checked overflow
//! - A FIFO deferred-task queue drained only when the stack is empty
//! - A runtime facade with an injected console and global error handler
//! - Walkthrough scenarios reproducing the classic ordering surprises
//!
//! # Example
//!
//! ```
//! use stacksim_runtime::{MemoryConsole, Runtime};
//! use std::time::Duration;
//!
//! let console = MemoryConsole::new();
//! let mut rt = Runtime::with_console(console.clone());
//! rt.run_script(|rt| {
//!     rt.log("A");
//!     rt.set_timeout(Duration::ZERO, |rt| {
//!         rt.log("B");
//!         Ok(())
//!     });
//!     rt.log("C");
//!     Ok(())
//! });
//! assert_eq!(console.messages(), vec!["A", "C", "B"]);
//! ```

/// stacksim runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod console;
pub mod error;
pub mod runtime;
pub mod scenarios;
pub mod scheduler;
pub mod stack;
pub mod tree;

pub use console::{Console, ConsoleEntry, ConsoleLevel, MemoryConsole, TracingConsole};
pub use error::{RuntimeError, StackError, TaskError, ThrownKind};
pub use runtime::{Runtime, ScriptReport, MAIN_FRAME};
pub use scheduler::{DeferredTask, ExecutionContext, TaskId, TaskScheduler, TickReport};
pub use stack::{Frame, StackSimulator, StackTrace, Trace, DEFAULT_MAX_DEPTH};
pub use tree::{ElementNode, TreeNode};

pub use stacksim_config::{Config, ConfigLoader, TickMode};

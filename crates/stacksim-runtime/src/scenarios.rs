//! Call-stack walkthroughs
//!
//! Each function replays one classic illustration of the execution model on
//! a [`Runtime`]:
//!
//! 1. [`event_listener_chain`]: a click handler calling down three levels
//!    until the innermost call throws.
//! 2. [`load_page`]: reading a property of missing data, producing the trace
//!    a developer would read bottom-up in the console.
//! 3. [`traverse`]: recursive tree walking, one frame per visited level.
//! 4. [`timer_ordering`]: a zero-delay timer still runs after the rest of
//!    the synchronous script.

use crate::console::Console;
use crate::error::{RuntimeError, ThrownKind};
use crate::runtime::{Runtime, ScriptReport};
use crate::tree::TreeNode;
use std::fmt;
use std::time::Duration;

/// Record handed down the event-listener chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
}

impl UserData {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Display for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ name: '{}', age: {}", self.name, self.age)?;
        if let Some(email) = &self.email {
            write!(f, ", email: '{}'", email)?;
        }
        write!(f, " }}")
    }
}

// ============================================================================
// 1. Event listener chain
// ============================================================================

/// `handleClick` -> `fetchUserData` -> `formatData`
///
/// Returns the formatted user, or `Error: Email is missing in user data!`
/// thrown from `formatData` with all three frames in its trace.
pub fn event_listener_chain(rt: &mut Runtime, user: &UserData) -> Result<String, RuntimeError> {
    rt.call("handleClick", |rt| {
        rt.log("Button clicked");
        fetch_user_data(rt, user)
    })
}

fn fetch_user_data(rt: &mut Runtime, user: &UserData) -> Result<String, RuntimeError> {
    rt.call("fetchUserData", |rt| {
        rt.log(&format!("User data fetched: {}", user));
        format_data(rt, user)
    })
}

fn format_data(rt: &mut Runtime, user: &UserData) -> Result<String, RuntimeError> {
    rt.call("formatData", |rt| match &user.email {
        Some(email) => Ok(format!("{} ({})", user.name, email)),
        None => Err(rt.throw(ThrownKind::Error, "Email is missing in user data!")),
    })
}

/// Deliver a click: runs the chain as a script so a failure reaches the
/// global error handler instead of the caller
pub fn dispatch_click(rt: &mut Runtime, user: &UserData) -> ScriptReport {
    rt.run_script(|rt| event_listener_chain(rt, user).map(|_| ()))
}

/// Install a `window.onerror` style handler that prefixes the report
pub fn install_global_error_handler(rt: &mut Runtime) {
    rt.on_uncaught(|error: &RuntimeError, console: &mut dyn Console| {
        console.error(&format!("Global Error Handler: {}", error.report()));
    });
}

// ============================================================================
// 2. Console stack trace
// ============================================================================

/// `loadPage` -> `fetchData` -> `processData`
///
/// With `None`, `processData` fails like a property read on `undefined`.
pub fn load_page(rt: &mut Runtime, data: Option<&UserData>) -> Result<String, RuntimeError> {
    rt.call("loadPage", |rt| {
        rt.call("fetchData", |rt| {
            rt.call("processData", |rt| match data {
                Some(user) => {
                    rt.log(&user.name);
                    Ok(user.name.clone())
                }
                None => Err(rt.throw(
                    ThrownKind::TypeError,
                    "Cannot read properties of undefined (reading 'name')",
                )),
            })
        })
    })
}

// ============================================================================
// 3. Recursive traversal
// ============================================================================

/// Frame name used for every level of [`traverse`]
pub const TRAVERSE_FRAME: &str = "traverseDOM";

/// Visit `root` depth-first, pre-order, one `traverseDOM` frame per level
///
/// Each visit logs the tag name. The recursion is driven by an explicit
/// cursor list so only the simulated stack grows; a tree deeper than the
/// remaining stack capacity fails with an overflow and leaves the stack as
/// it was before the call.
pub fn traverse<N: TreeNode>(rt: &mut Runtime, root: &N) -> Result<Vec<String>, RuntimeError> {
    let base = rt.stack().depth();
    let mut visited = Vec::new();

    if let Err(error) = visit(rt, root, &mut visited) {
        rt.unwind_to(base);
        return Err(error);
    }
    let mut cursors = vec![root.children()];

    while let Some(cursor) = cursors.last_mut() {
        match cursor.next() {
            Some(child) => {
                if let Err(error) = visit(rt, child, &mut visited) {
                    rt.unwind_to(base);
                    return Err(error);
                }
                cursors.push(child.children());
            }
            None => {
                cursors.pop();
                rt.leave()?;
            }
        }
    }

    Ok(visited)
}

fn visit<N: TreeNode>(
    rt: &mut Runtime,
    node: &N,
    visited: &mut Vec<String>,
) -> Result<(), RuntimeError> {
    rt.enter(TRAVERSE_FRAME)?;
    rt.log(node.tag_name());
    visited.push(node.tag_name().to_string());
    Ok(())
}

// ============================================================================
// 4. Timer ordering
// ============================================================================

/// `console.log("A"); setTimeout(() => console.log("B"), delay); console.log("C");`
///
/// The console ends up with `A`, `C`, `B` for every `delay`, zero included.
pub fn timer_ordering(rt: &mut Runtime, delay: Duration) -> ScriptReport {
    rt.run_script(|rt| {
        rt.log("A");
        rt.set_timeout(delay, |rt| {
            rt.log("B");
            Ok(())
        });
        rt.log("C");
        Ok(())
    })
}

pub(crate) mod native;
pub(crate) mod pikevm;

use crate::exec::InterruptHandler;

/// Per-execution limits and the interrupt collaborator handed to a body.
#[derive(Clone, Copy)]
pub(crate) struct RunContext<'a> {
    /// Maximum number of frames on the interpreter's work stack.
    pub(crate) stack_limit: usize,
    /// Number of haystack positions between interrupt polls.
    pub(crate) poll_interval: usize,
    pub(crate) interrupt: &'a dyn InterruptHandler,
}

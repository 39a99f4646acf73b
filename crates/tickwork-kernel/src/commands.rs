//! Ready-made [`Command`] implementations built from closures.
//!
//! | Command | initialize | execute | finishes |
//! |---|---|---|---|
//! | [`InstantCommand`] | runs the action | – | immediately |
//! | [`RunCommand`] | – | runs the action | never |
//! | [`StartEndCommand`] | runs `on_start` | – | never; `on_end` runs in `end` |
//! | [`PrintCommand`] | logs a message | – | immediately |
//! | [`WaitTicksCommand`] | resets the counter | counts | after N executes |

use tickwork_types::{ResourceId, TickError};
use tracing::info;

use crate::command::{Command, CommandContext};

/// Closure body shared by the closure-backed commands.
pub type CommandFn = Box<dyn FnMut(&mut CommandContext<'_>) -> Result<(), TickError> + Send>;

// ─────────────────────────────────────────────────────────────────────────────
// InstantCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs its action once, in `initialize`, and finishes on the same tick.
///
/// # Example
///
/// ```
/// use tickwork_kernel::{Command, InstantCommand};
///
/// let cmd = InstantCommand::new("noop", vec![], |_ctx| Ok(()));
/// assert_eq!(cmd.name(), "noop");
/// assert!(cmd.requirements().is_empty());
/// ```
pub struct InstantCommand {
    name: String,
    requirements: Vec<ResourceId>,
    action: CommandFn,
}

impl InstantCommand {
    pub fn new<F>(name: impl Into<String>, requirements: Vec<ResourceId>, action: F) -> Self
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<(), TickError> + Send + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ResourceId] {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        (self.action)(ctx)
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RunCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs its action every tick until interrupted.
pub struct RunCommand {
    name: String,
    requirements: Vec<ResourceId>,
    action: CommandFn,
}

impl RunCommand {
    pub fn new<F>(name: impl Into<String>, requirements: Vec<ResourceId>, action: F) -> Self
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<(), TickError> + Send + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ResourceId] {
        &self.requirements
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        (self.action)(ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StartEndCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs `on_start` when scheduled and `on_end` when the run ends, however it
/// ends.  Pairs naturally with a `while_true` binding.
pub struct StartEndCommand {
    name: String,
    requirements: Vec<ResourceId>,
    on_start: CommandFn,
    on_end: CommandFn,
}

impl StartEndCommand {
    pub fn new<S, E>(
        name: impl Into<String>,
        requirements: Vec<ResourceId>,
        on_start: S,
        on_end: E,
    ) -> Self
    where
        S: FnMut(&mut CommandContext<'_>) -> Result<(), TickError> + Send + 'static,
        E: FnMut(&mut CommandContext<'_>) -> Result<(), TickError> + Send + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            on_start: Box::new(on_start),
            on_end: Box::new(on_end),
        }
    }
}

impl Command for StartEndCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ResourceId] {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        (self.on_start)(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), TickError> {
        (self.on_end)(ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PrintCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Logs a message at `info` level and finishes.  Requires nothing.
pub struct PrintCommand {
    message: String,
}

impl PrintCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Command for PrintCommand {
    fn name(&self) -> &str {
        "print"
    }

    fn requirements(&self) -> &[ResourceId] {
        &[]
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        info!(command = %ctx.command_id(), tick = ctx.tick(), "{}", self.message);
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WaitTicksCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Finishes after it has executed `ticks` times.  Requires nothing.
pub struct WaitTicksCommand {
    ticks: u64,
    elapsed: u64,
}

impl WaitTicksCommand {
    pub fn new(ticks: u64) -> Self {
        Self { ticks, elapsed: 0 }
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }
}

impl Command for WaitTicksCommand {
    fn name(&self) -> &str {
        "wait-ticks"
    }

    fn requirements(&self) -> &[ResourceId] {
        &[]
    }

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        self.elapsed = 0;
        Ok(())
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        self.elapsed += 1;
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        self.elapsed >= self.ticks
    }
}

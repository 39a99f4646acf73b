//! `tickwork-kernel` – Ownership & Scheduling
//!
//! Decides *who* may drive *which* resource *when*.  It never decides what
//! value is sent; that is the commands' business.
//!
//! # Modules
//!
//! - [`resource`] – [`Subsystem`][resource::Subsystem] and
//!   [`ResourceSlot`][resource::ResourceSlot]: exclusive ownership of one
//!   subsystem plus its per-tick hook.
//! - [`command`] – [`Command`][command::Command] lifecycle hooks and the
//!   [`CommandContext`][command::CommandContext] that gates mutable access
//!   to subsystems on ownership.
//! - [`commands`] – closure-backed commands: instant, run, start/end, print,
//!   and wait-ticks.
//! - [`trigger`] – [`Trigger`][trigger::Trigger] edge detection and
//!   [`Binding`][trigger::Binding]s from edges to [`Action`][trigger::Action]s.
//! - [`scheduler`] – [`Scheduler`][scheduler::Scheduler]: the per-tick
//!   driver that resolves conflicts, advances commands and ticks resources.

pub mod command;
pub mod commands;
pub mod resource;
pub mod scheduler;
pub mod trigger;

pub use command::{Command, CommandContext};
pub use commands::{
    CommandFn, InstantCommand, PrintCommand, RunCommand, StartEndCommand, WaitTicksCommand,
};
pub use resource::{ResourcePool, ResourceSlot, Subsystem};
pub use scheduler::{DEFAULT_FAULT_CAPACITY, Scheduler, SchedulerConfig};
pub use trigger::{Action, Binding, Edge, Trigger, classify};

//! [`Scheduler`] – the fixed-rate driver.
//!
//! The scheduler owns every resource, command and trigger in the process.
//! Nothing here is global: the runtime creates one scheduler and calls
//! [`Scheduler::run`] once per tick.
//!
//! # Tick order
//!
//! 1. Poll every trigger; queue the action bound to each edge that fired.
//! 2. Apply queued actions in the order they were queued.  Scheduling a
//!    command interrupts whichever running commands own its requirements
//!    (last scheduled wins) before the new command's `initialize`.
//! 3. For every running command, in scheduling order: `execute`, then
//!    `is_finished`; finished commands get `end(false)`.
//! 4. Schedule the default command of every resource left unowned.
//! 5. Run every resource's per-tick hook once, in registration order.
//!
//! Given identical trigger samples, two schedulers wired the same way go
//! through identical state sequences.
//!
//! # Example
//!
//! ```
//! use tickwork_kernel::{Scheduler, SchedulerConfig, WaitTicksCommand};
//!
//! let mut scheduler = Scheduler::new(SchedulerConfig::default());
//! let wait = scheduler.register_command(WaitTicksCommand::new(2)).unwrap();
//!
//! scheduler.schedule(wait).unwrap();
//! scheduler.run();
//! assert!(scheduler.is_running(wait));
//! scheduler.run();
//! assert!(!scheduler.is_running(wait));
//! ```

use std::collections::VecDeque;

use tickwork_types::{
    CommandId, CommandState, CommandStatus, FaultRecord, ResourceId, SchedulerSnapshot,
    TickError, TriggerId,
};
use tracing::{debug, info, trace, warn};

use crate::command::{Command, CommandContext};
use crate::resource::{ResourcePool, Subsystem};
use crate::trigger::{Action, Binding, Trigger};

/// Fault ring size used when nothing else is configured.
pub const DEFAULT_FAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Most recent faults kept for [`Scheduler::faults`].  Zero keeps none.
    pub fault_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fault_capacity: DEFAULT_FAULT_CAPACITY,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal entry
// ─────────────────────────────────────────────────────────────────────────────

struct CommandEntry {
    command: Box<dyn Command>,
    requirements: Vec<ResourceId>,
    /// `None` until the first scheduling.
    state: Option<CommandState>,
    runs: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

pub struct Scheduler {
    config: SchedulerConfig,
    resources: ResourcePool,
    commands: Vec<CommandEntry>,
    /// Running commands in scheduling order.
    running: Vec<CommandId>,
    pending: VecDeque<Action>,
    triggers: Vec<Trigger>,
    tick: u64,
    faults: VecDeque<FaultRecord>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            resources: ResourcePool::new(),
            commands: Vec::new(),
            running: Vec::new(),
            pending: VecDeque::new(),
            triggers: Vec::new(),
            tick: 0,
            faults: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ── Wiring ──────────────────────────────────────────────────────────────

    /// Take ownership of `subsystem` and make it schedulable.
    ///
    /// # Errors
    ///
    /// [`TickError::DuplicateResource`] if the id is already registered.
    pub fn register_subsystem<S: Subsystem>(&mut self, subsystem: S) -> Result<ResourceId, TickError> {
        let id = self.resources.insert(Box::new(subsystem))?;
        debug!(resource = %id, "subsystem registered");
        Ok(id)
    }

    /// Register a command and hand back its id.  Requirements are read here
    /// and never again.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownResource`] if a requirement is not registered.
    pub fn register_command<C: Command + 'static>(&mut self, command: C) -> Result<CommandId, TickError> {
        let mut requirements: Vec<ResourceId> = Vec::new();
        for resource in command.requirements() {
            if !self.resources.contains(resource) {
                return Err(TickError::UnknownResource(resource.clone()));
            }
            if !requirements.contains(resource) {
                requirements.push(resource.clone());
            }
        }

        let id = CommandId(self.commands.len() as u32);
        debug!(command = %id, name = command.name(), ?requirements, "command registered");
        self.commands.push(CommandEntry {
            command: Box::new(command),
            requirements,
            state: None,
            runs: 0,
        });
        Ok(id)
    }

    /// Run `command` whenever `resource` is left unowned.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownResource`] / [`TickError::UnknownCommand`] for
    /// unregistered ids, [`TickError::RequirementMismatch`] if `command` does
    /// not require `resource`.
    pub fn set_default_command(&mut self, resource: &ResourceId, command: CommandId) -> Result<(), TickError> {
        let entry = self.entry(command)?;
        if !entry.requirements.contains(resource) {
            if !self.resources.contains(resource) {
                return Err(TickError::UnknownResource(resource.clone()));
            }
            return Err(TickError::RequirementMismatch {
                command,
                resource: resource.clone(),
            });
        }
        let slot = self
            .resources
            .get_mut(resource)
            .ok_or_else(|| TickError::UnknownResource(resource.clone()))?;
        slot.set_default_command(command);
        debug!(resource = %resource, command = %command, "default command set");
        Ok(())
    }

    /// Attach a trigger.  `sample` is called exactly once per tick.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownCommand`] if the binding refers to an unregistered
    /// command.
    pub fn bind<F>(&mut self, name: impl Into<String>, sample: F, binding: Binding) -> Result<TriggerId, TickError>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        for command in binding.commands() {
            self.entry(command)?;
        }
        let id = TriggerId(self.triggers.len() as u32);
        let trigger = Trigger::new(id, name, sample, binding);
        debug!(trigger = %id, name = trigger.name(), ?binding, "trigger bound");
        self.triggers.push(trigger);
        Ok(id)
    }

    // ── Requests ────────────────────────────────────────────────────────────

    /// Queue an action for the next tick's request phase.
    pub fn request(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    /// Start a new run of `id` right away.
    ///
    /// Running owners of any required resource are interrupted first.
    /// Scheduling a command that is already running does nothing.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownCommand`] if `id` was never registered.  A failing
    /// `initialize` is recorded as a fault, not returned.
    pub fn schedule(&mut self, id: CommandId) -> Result<(), TickError> {
        let requirements = self.entry(id)?.requirements.clone();
        if self.is_running(id) {
            trace!(command = %id, "already running; schedule ignored");
            return Ok(());
        }

        let mut displaced: Vec<CommandId> = Vec::new();
        for resource in &requirements {
            if let Some(owner) = self.resources.get(resource).and_then(|slot| slot.owner())
                && owner != id
                && !displaced.contains(&owner)
            {
                displaced.push(owner);
            }
        }
        for owner in displaced {
            info!(command = %owner, by = %id, "command interrupted by conflicting schedule");
            self.finish(owner, true);
        }

        for resource in &requirements {
            if let Some(slot) = self.resources.get_mut(resource) {
                slot.request_ownership(id);
            }
        }

        let entry = self.entry_mut(id)?;
        entry.state = Some(CommandState::Initialized);
        entry.runs += 1;
        info!(command = %id, name = entry.command.name(), run = entry.runs, "command scheduled");
        self.running.push(id);

        match self.with_context(id, |command, ctx| command.initialize(ctx))? {
            Ok(()) => {
                self.entry_mut(id)?.state = Some(CommandState::Running);
            }
            Err(e) => {
                self.record_fault(Some(id), e);
                self.finish(id, true);
            }
        }
        Ok(())
    }

    /// Interrupt `id`.  Does nothing if it is not running.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownCommand`] if `id` was never registered.
    pub fn cancel(&mut self, id: CommandId) -> Result<(), TickError> {
        self.entry(id)?;
        if self.is_running(id) {
            info!(command = %id, "command cancelled");
            self.finish(id, true);
        }
        Ok(())
    }

    /// Interrupt every running command, in scheduling order.
    pub fn cancel_all(&mut self) {
        let running = self.running.clone();
        if !running.is_empty() {
            info!(count = running.len(), "cancelling all commands");
        }
        for id in running {
            self.finish(id, true);
        }
    }

    fn apply(&mut self, action: Action) -> Result<(), TickError> {
        match action {
            Action::Schedule(id) => self.schedule(id),
            Action::Cancel(id) => self.cancel(id),
            Action::Toggle(id) => {
                if self.is_running(id) {
                    self.cancel(id)
                } else {
                    self.schedule(id)
                }
            }
            Action::Replace { cancel, schedule } => {
                self.cancel(cancel)?;
                self.schedule(schedule)
            }
        }
    }

    // ── Tick ────────────────────────────────────────────────────────────────

    /// Advance the scheduler by one tick.  Never blocks.
    pub fn run(&mut self) {
        self.tick += 1;
        trace!(tick = self.tick, "tick start");

        for trigger in &mut self.triggers {
            if let Some((edge, action)) = trigger.fire() {
                debug!(trigger = trigger.name(), ?edge, ?action, "trigger fired");
                self.pending.push_back(action);
            }
        }

        while let Some(action) = self.pending.pop_front() {
            if let Err(e) = self.apply(action) {
                self.record_fault(None, e);
            }
        }

        for id in self.running.clone() {
            // Hooks cannot schedule, so only `finish` below shrinks the set.
            let outcome = self.with_context(id, |command, ctx| {
                let result = command.execute(ctx);
                (result, command.is_finished(ctx))
            });
            match outcome {
                Ok((result, finished)) => {
                    if let Err(e) = result {
                        self.record_fault(Some(id), e);
                    }
                    if finished {
                        self.finish(id, false);
                    }
                }
                Err(e) => self.record_fault(Some(id), e),
            }
        }

        let defaults: Vec<CommandId> = self
            .resources
            .iter()
            .filter(|slot| slot.is_idle())
            .filter_map(|slot| slot.default_command())
            .collect();
        for id in defaults {
            if let Err(e) = self.schedule(id) {
                self.record_fault(Some(id), e);
            }
        }

        for slot in self.resources.iter_mut() {
            slot.tick();
        }
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn entry(&self, id: CommandId) -> Result<&CommandEntry, TickError> {
        self.commands
            .get(id.0 as usize)
            .ok_or(TickError::UnknownCommand(id))
    }

    fn entry_mut(&mut self, id: CommandId) -> Result<&mut CommandEntry, TickError> {
        self.commands
            .get_mut(id.0 as usize)
            .ok_or(TickError::UnknownCommand(id))
    }

    /// Run `f` against command `id` with a context over the resource pool.
    fn with_context<R>(
        &mut self,
        id: CommandId,
        f: impl FnOnce(&mut dyn Command, &mut CommandContext<'_>) -> R,
    ) -> Result<R, TickError> {
        let entry = self
            .commands
            .get_mut(id.0 as usize)
            .ok_or(TickError::UnknownCommand(id))?;
        let mut ctx = CommandContext::new(&mut self.resources, id, self.tick);
        Ok(f(entry.command.as_mut(), &mut ctx))
    }

    /// Running → Finished: `end`, then release every requirement.
    fn finish(&mut self, id: CommandId, interrupted: bool) {
        let Some(position) = self.running.iter().position(|&r| r == id) else {
            return;
        };
        self.running.remove(position);

        match self.with_context(id, |command, ctx| command.end(ctx, interrupted)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) | Err(e) => self.record_fault(Some(id), e),
        }

        let Ok(entry) = self.entry_mut(id) else {
            return;
        };
        entry.state = Some(CommandState::Finished);
        let requirements = entry.requirements.clone();
        for resource in &requirements {
            if let Some(slot) = self.resources.get_mut(resource) {
                slot.release_ownership(id);
            }
        }
        debug!(command = %id, interrupted, tick = self.tick, "command finished");
    }

    fn record_fault(&mut self, command: Option<CommandId>, error: TickError) {
        warn!(tick = self.tick, command = ?command, error = %error, "command fault");
        if self.config.fault_capacity == 0 {
            return;
        }
        while self.faults.len() >= self.config.fault_capacity {
            self.faults.pop_front();
        }
        self.faults.push_back(FaultRecord {
            tick: self.tick,
            command,
            error,
        });
    }

    // ── Read-only views ─────────────────────────────────────────────────────

    /// Number of completed calls to [`run`][Self::run].
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn owner_of(&self, resource: &ResourceId) -> Option<CommandId> {
        self.resources.get(resource).and_then(|slot| slot.owner())
    }

    /// State of the current or most recent run; `None` if never scheduled.
    pub fn state_of(&self, id: CommandId) -> Option<CommandState> {
        self.entry(id).ok().and_then(|entry| entry.state)
    }

    pub fn is_running(&self, id: CommandId) -> bool {
        self.running.contains(&id)
    }

    /// Running commands in scheduling order.
    pub fn running(&self) -> &[CommandId] {
        &self.running
    }

    /// How many times `id` has been scheduled.
    pub fn runs(&self, id: CommandId) -> u64 {
        self.entry(id).map(|entry| entry.runs).unwrap_or(0)
    }

    pub fn command_name(&self, id: CommandId) -> Option<&str> {
        self.entry(id).ok().map(|entry| entry.command.name())
    }

    /// Actions queued for the next tick.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Most recent faults, oldest first.
    pub fn faults(&self) -> &VecDeque<FaultRecord> {
        &self.faults
    }

    /// How many per-tick hooks `resource` has received.
    pub fn resource_ticks(&self, resource: &ResourceId) -> Option<u64> {
        self.resources.get(resource).map(|slot| slot.ticks())
    }

    /// Typed read-only access to a registered subsystem.
    pub fn subsystem<T: Subsystem>(&self, resource: &ResourceId) -> Option<&T> {
        self.resources
            .get(resource)
            .and_then(|slot| slot.subsystem().as_any().downcast_ref::<T>())
    }

    pub fn resource_ids(&self) -> Vec<ResourceId> {
        self.resources.iter().map(|slot| slot.id().clone()).collect()
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let running = self
            .running
            .iter()
            .filter_map(|&id| {
                let entry = self.entry(id).ok()?;
                Some(CommandStatus {
                    id,
                    name: entry.command.name().to_string(),
                    state: entry.state.unwrap_or(CommandState::Initialized),
                    requirements: entry.requirements.clone(),
                })
            })
            .collect();

        SchedulerSnapshot {
            tick: self.tick,
            running,
            resources: self.resources.iter().map(|slot| slot.status()).collect(),
            faults: self.faults.iter().cloned().collect(),
        }
    }
}

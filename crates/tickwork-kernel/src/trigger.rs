//! Edge-triggered bindings from boolean conditions to command actions.
//!
//! A [`Trigger`] samples its condition once per scheduler tick and compares
//! the sample with the previous one.  Only transitions fire: holding a
//! button down schedules nothing after the first tick.  There is no
//! debounce; a condition that flips every tick fires every tick.
//!
//! The first sample only primes the trigger, so a button that is already
//! held at boot does not count as a press.

use tickwork_types::{CommandId, TriggerId};

/// Direction of a transition between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// `false → true`
    Rising,
    /// `true → false`
    Falling,
}

/// Compare two consecutive samples.  `previous == None` means the trigger
/// has not been sampled yet and never yields an edge.
pub fn classify(previous: Option<bool>, current: bool) -> Option<Edge> {
    match (previous?, current) {
        (false, true) => Some(Edge::Rising),
        (true, false) => Some(Edge::Falling),
        _ => None,
    }
}

/// What the scheduler should do when an edge fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Schedule(CommandId),
    Cancel(CommandId),
    /// Cancel if running, otherwise schedule.
    Toggle(CommandId),
    /// Cancel one command and schedule another, in that order.
    Replace {
        cancel: CommandId,
        schedule: CommandId,
    },
}

impl Action {
    /// Every command the action refers to.
    pub fn commands(&self) -> Vec<CommandId> {
        match *self {
            Action::Schedule(id) | Action::Cancel(id) | Action::Toggle(id) => vec![id],
            Action::Replace { cancel, schedule } => vec![cancel, schedule],
        }
    }
}

/// Actions attached to each edge of one trigger.  Either may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Binding {
    pub on_rising: Option<Action>,
    pub on_falling: Option<Action>,
}

impl Binding {
    /// Schedule `command` when the condition becomes true.
    pub fn on_true(command: CommandId) -> Self {
        Self {
            on_rising: Some(Action::Schedule(command)),
            on_falling: None,
        }
    }

    /// Schedule `command` when the condition becomes false.
    pub fn on_false(command: CommandId) -> Self {
        Self {
            on_rising: None,
            on_falling: Some(Action::Schedule(command)),
        }
    }

    /// Run `command` for as long as the condition holds.
    pub fn while_true(command: CommandId) -> Self {
        Self {
            on_rising: Some(Action::Schedule(command)),
            on_falling: Some(Action::Cancel(command)),
        }
    }

    /// Flip `command` between running and not running on every press.
    pub fn toggle_on_true(command: CommandId) -> Self {
        Self {
            on_rising: Some(Action::Toggle(command)),
            on_falling: None,
        }
    }

    /// Add or replace the falling-edge action.
    pub fn and_on_false(mut self, action: Action) -> Self {
        self.on_falling = Some(action);
        self
    }

    pub fn action_for(&self, edge: Edge) -> Option<Action> {
        match edge {
            Edge::Rising => self.on_rising,
            Edge::Falling => self.on_falling,
        }
    }

    pub(crate) fn commands(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.on_rising
            .iter()
            .chain(self.on_falling.iter())
            .flat_map(Action::commands)
    }
}

/// Condition sampler; called exactly once per tick.
pub type Sampler = Box<dyn FnMut() -> bool + Send>;

/// A named condition plus its binding and the last sample taken.
pub struct Trigger {
    id: TriggerId,
    name: String,
    sample: Sampler,
    previous: Option<bool>,
    binding: Binding,
}

impl Trigger {
    pub fn new<F>(id: TriggerId, name: impl Into<String>, sample: F, binding: Binding) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self {
            id,
            name: name.into(),
            sample: Box::new(sample),
            previous: None,
            binding,
        }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Most recent sample, `None` before the first poll.
    pub fn last_sample(&self) -> Option<bool> {
        self.previous
    }

    /// Sample the condition and classify the transition from the previous
    /// sample.
    pub fn poll(&mut self) -> Option<Edge> {
        let current = (self.sample)();
        let edge = classify(self.previous, current);
        self.previous = Some(current);
        edge
    }

    /// [`poll`][Self::poll], then look up the action bound to the edge.
    pub fn fire(&mut self) -> Option<(Edge, Action)> {
        let edge = self.poll()?;
        self.binding.action_for(edge).map(|action| (edge, action))
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("previous", &self.previous)
            .field("binding", &self.binding)
            .finish()
    }
}

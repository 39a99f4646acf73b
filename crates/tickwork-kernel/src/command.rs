//! The [`Command`] trait and the [`CommandContext`] commands run against.
//!
//! A command is a unit of work bound to the resources it requires.  Each
//! scheduling of a command is one *run*:
//!
//! ```text
//! initialize ─▶ execute ─▶ is_finished? ─no─▶ execute ─▶ …
//!                               │
//!                              yes ─▶ end(interrupted = false)
//! ```
//!
//! A run can also be cut short at any point after `initialize` by a
//! conflicting command or an explicit cancel, in which case `end` is called
//! with `interrupted = true`.  Either way `initialize` and `end` each run
//! exactly once per run.

use tickwork_types::{CommandId, ResourceId, TickError};

use crate::resource::{ResourcePool, Subsystem};

/// Access to the resource pool on behalf of one command for one hook call.
pub struct CommandContext<'a> {
    resources: &'a mut ResourcePool,
    command: CommandId,
    tick: u64,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(resources: &'a mut ResourcePool, command: CommandId, tick: u64) -> Self {
        Self {
            resources,
            command,
            tick,
        }
    }

    /// The command this context was opened for.
    pub fn command_id(&self) -> CommandId {
        self.command
    }

    /// Scheduler tick the hook is running in.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the calling command currently owns `resource`.
    pub fn owns(&self, resource: &ResourceId) -> bool {
        self.resources
            .get(resource)
            .is_some_and(|slot| slot.owner() == Some(self.command))
    }

    /// Read-only view of a subsystem.  Needs no ownership.
    ///
    /// # Errors
    ///
    /// [`TickError::UnknownResource`] if nothing is registered under `id`,
    /// [`TickError::WrongSubsystemType`] if it is not a `T`.
    pub fn subsystem<T: Subsystem>(&self, id: &ResourceId) -> Result<&T, TickError> {
        let slot = self
            .resources
            .get(id)
            .ok_or_else(|| TickError::UnknownResource(id.clone()))?;
        slot.subsystem()
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_type::<T>(id))
    }

    /// Mutable access to a subsystem the calling command owns.
    ///
    /// # Errors
    ///
    /// [`TickError::ResourceNotOwned`] unless the calling command owns `id`,
    /// plus the lookup errors of [`subsystem`][Self::subsystem].
    pub fn subsystem_mut<T: Subsystem>(&mut self, id: &ResourceId) -> Result<&mut T, TickError> {
        let slot = self
            .resources
            .get_mut(id)
            .ok_or_else(|| TickError::UnknownResource(id.clone()))?;
        slot.subsystem_mut(self.command)?
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| wrong_type::<T>(id))
    }
}

fn wrong_type<T>(id: &ResourceId) -> TickError {
    TickError::WrongSubsystemType {
        resource: id.clone(),
        expected: std::any::type_name::<T>().to_string(),
    }
}

/// A unit of work the [`Scheduler`][crate::scheduler::Scheduler] can run.
///
/// Requirements are read once, at registration.  Hook errors are recorded
/// as scheduler faults: a failing `initialize` ends the run as interrupted,
/// a failing `execute` only aborts that call.
pub trait Command: Send {
    fn name(&self) -> &str;

    /// Resources this command needs exclusively while it runs.
    fn requirements(&self) -> &[ResourceId];

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        Ok(())
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), TickError> {
        Ok(())
    }

    /// Evaluated after every `execute`.  The default never finishes.
    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        false
    }

    /// Called once when the run ends; resources are still owned here and are
    /// released right after.
    fn end(&mut self, _ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), TickError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;

    struct Gauge {
        reading: f32,
    }

    impl Subsystem for Gauge {
        fn id(&self) -> &str {
            "gauge"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Other;

    impl Subsystem for Other {
        fn id(&self) -> &str {
            "other"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn pool() -> ResourcePool {
        let mut pool = ResourcePool::new();
        pool.insert(Box::new(Gauge { reading: 1.5 })).unwrap();
        pool
    }

    #[test]
    fn reads_need_no_ownership() {
        let mut pool = pool();
        let ctx = CommandContext::new(&mut pool, CommandId(3), 7);
        let gauge = ctx.subsystem::<Gauge>(&"gauge".into()).unwrap();
        assert!((gauge.reading - 1.5).abs() < f32::EPSILON);
        assert_eq!(ctx.tick(), 7);
        assert!(!ctx.owns(&"gauge".into()));
    }

    #[test]
    fn writes_need_ownership() {
        let mut pool = pool();
        let mut ctx = CommandContext::new(&mut pool, CommandId(3), 1);
        let err = ctx.subsystem_mut::<Gauge>(&"gauge".into()).err().unwrap();
        assert!(matches!(err, TickError::ResourceNotOwned { caller: CommandId(3), .. }));

        pool.get_mut(&"gauge".into()).unwrap().request_ownership(CommandId(3));
        let mut ctx = CommandContext::new(&mut pool, CommandId(3), 1);
        ctx.subsystem_mut::<Gauge>(&"gauge".into()).unwrap().reading = 2.0;
        assert!(ctx.owns(&"gauge".into()));
    }

    #[test]
    fn unknown_and_mistyped_lookups_fail() {
        let mut pool = pool();
        let ctx = CommandContext::new(&mut pool, CommandId(0), 1);
        assert_eq!(
            ctx.subsystem::<Gauge>(&"missing".into()).err(),
            Some(TickError::UnknownResource("missing".into()))
        );
        assert!(matches!(
            ctx.subsystem::<Other>(&"gauge".into()),
            Err(TickError::WrongSubsystemType { .. })
        ));
    }
}

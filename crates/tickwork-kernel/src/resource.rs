//! Resources – exclusively-ownable subsystems and their ownership bookkeeping.
//!
//! A [`Subsystem`] wraps one or more devices and exposes whatever mutating
//! operations make sense for it.  The scheduler stores every subsystem in a
//! [`ResourceSlot`] that tracks which command currently owns it.  At most one
//! running command owns a slot; an unowned slot is idle but still gets its
//! [`Subsystem::periodic`] hook every tick.
//!
//! Commands only ever reach a subsystem mutably through
//! [`CommandContext::subsystem_mut`][crate::command::CommandContext::subsystem_mut],
//! which refuses with [`TickError::ResourceNotOwned`] unless the calling
//! command owns the slot.

use std::any::Any;
use std::collections::HashMap;

use tickwork_types::{CommandId, DeviceStatus, ResourceId, ResourceStatus, TickError};

/// A controllable unit of the robot (shooter, LEDs, drivetrain, …).
///
/// `as_any` / `as_any_mut` let the scheduler hand out typed references; the
/// usual implementation is `self`.
pub trait Subsystem: Send + 'static {
    /// Stable identifier, unique among registered subsystems.
    fn id(&self) -> &str;

    /// Runs once per tick whether or not a command owns the subsystem.
    /// Use it for sensor refresh and safe-state maintenance; it must not
    /// block.
    fn periodic(&mut self) {}

    /// Connection state of the devices this subsystem wraps.
    fn device_status(&self) -> Vec<DeviceStatus> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceSlot
// ─────────────────────────────────────────────────────────────────────────────

/// One registered subsystem plus its ownership state.
pub struct ResourceSlot {
    id: ResourceId,
    owner: Option<CommandId>,
    default_command: Option<CommandId>,
    ticks: u64,
    subsystem: Box<dyn Subsystem>,
}

impl ResourceSlot {
    pub fn new(subsystem: Box<dyn Subsystem>) -> Self {
        Self {
            id: ResourceId::new(subsystem.id()),
            owner: None,
            default_command: None,
            ticks: 0,
            subsystem,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn owner(&self) -> Option<CommandId> {
        self.owner
    }

    pub fn is_idle(&self) -> bool {
        self.owner.is_none()
    }

    /// Claim the slot for `command`.
    ///
    /// Succeeds when the slot is unowned or already owned by `command`.
    pub fn request_ownership(&mut self, command: CommandId) -> bool {
        match self.owner {
            None => {
                self.owner = Some(command);
                true
            }
            Some(current) => current == command,
        }
    }

    /// Give the slot up.  No-op unless `command` is the current owner, so a
    /// stale command cannot release a slot it no longer controls.
    pub fn release_ownership(&mut self, command: CommandId) {
        if self.owner == Some(command) {
            self.owner = None;
        }
    }

    /// Per-tick hook, independent of ownership.
    pub fn tick(&mut self) {
        self.ticks += 1;
        self.subsystem.periodic();
    }

    /// How many times [`tick`][Self::tick] has run.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn default_command(&self) -> Option<CommandId> {
        self.default_command
    }

    pub(crate) fn set_default_command(&mut self, command: CommandId) {
        self.default_command = Some(command);
    }

    pub fn subsystem(&self) -> &dyn Subsystem {
        self.subsystem.as_ref()
    }

    /// Mutable access for `caller`, refused unless `caller` owns the slot.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::ResourceNotOwned`] when `caller` is not the owner.
    pub fn subsystem_mut(&mut self, caller: CommandId) -> Result<&mut dyn Subsystem, TickError> {
        if self.owner != Some(caller) {
            return Err(TickError::ResourceNotOwned {
                resource: self.id.clone(),
                caller,
            });
        }
        Ok(self.subsystem.as_mut())
    }

    pub fn status(&self) -> ResourceStatus {
        ResourceStatus {
            id: self.id.clone(),
            owner: self.owner,
            default_command: self.default_command,
            devices: self.subsystem.device_status(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourcePool
// ─────────────────────────────────────────────────────────────────────────────

/// Every registered subsystem, kept in registration order.
#[derive(Default)]
pub struct ResourcePool {
    slots: Vec<ResourceSlot>,
    index: HashMap<ResourceId, usize>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subsystem` under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DuplicateResource`] if the id is taken.
    pub fn insert(&mut self, subsystem: Box<dyn Subsystem>) -> Result<ResourceId, TickError> {
        let slot = ResourceSlot::new(subsystem);
        let id = slot.id().clone();
        if self.index.contains_key(&id) {
            return Err(TickError::DuplicateResource(id));
        }
        self.index.insert(id.clone(), self.slots.len());
        self.slots.push(slot);
        Ok(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ResourceSlot> {
        self.index.get(id).map(|&i| &self.slots[i])
    }

    pub fn get_mut(&mut self, id: &ResourceId) -> Option<&mut ResourceSlot> {
        self.index.get(id).map(|&i| &mut self.slots[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResourceSlot> {
        self.slots.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lamp {
        periodic_calls: u32,
    }

    impl Subsystem for Lamp {
        fn id(&self) -> &str {
            "lamp"
        }

        fn periodic(&mut self) {
            self.periodic_calls += 1;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn slot() -> ResourceSlot {
        ResourceSlot::new(Box::new(Lamp { periodic_calls: 0 }))
    }

    #[test]
    fn unowned_slot_grants_ownership() {
        let mut slot = slot();
        assert!(slot.is_idle());
        assert!(slot.request_ownership(CommandId(1)));
        assert_eq!(slot.owner(), Some(CommandId(1)));
    }

    #[test]
    fn same_owner_may_request_again() {
        let mut slot = slot();
        assert!(slot.request_ownership(CommandId(1)));
        assert!(slot.request_ownership(CommandId(1)));
    }

    #[test]
    fn other_command_is_refused() {
        let mut slot = slot();
        slot.request_ownership(CommandId(1));
        assert!(!slot.request_ownership(CommandId(2)));
        assert_eq!(slot.owner(), Some(CommandId(1)));
    }

    #[test]
    fn stale_release_is_ignored() {
        let mut slot = slot();
        slot.request_ownership(CommandId(1));
        slot.release_ownership(CommandId(2));
        assert_eq!(slot.owner(), Some(CommandId(1)));
        slot.release_ownership(CommandId(1));
        assert!(slot.is_idle());
    }

    #[test]
    fn mutable_access_requires_ownership() {
        let mut slot = slot();
        let err = slot.subsystem_mut(CommandId(4)).err().unwrap();
        assert_eq!(
            err,
            TickError::ResourceNotOwned {
                resource: "lamp".into(),
                caller: CommandId(4),
            }
        );

        slot.request_ownership(CommandId(4));
        assert!(slot.subsystem_mut(CommandId(4)).is_ok());
    }

    #[test]
    fn tick_runs_periodic_regardless_of_owner() {
        let mut slot = slot();
        slot.tick();
        slot.request_ownership(CommandId(0));
        slot.tick();
        assert_eq!(slot.ticks(), 2);
        let lamp = slot.subsystem().as_any().downcast_ref::<Lamp>().unwrap();
        assert_eq!(lamp.periodic_calls, 2);
    }

    #[test]
    fn pool_rejects_duplicate_ids() {
        let mut pool = ResourcePool::new();
        pool.insert(Box::new(Lamp { periodic_calls: 0 })).unwrap();
        let err = pool.insert(Box::new(Lamp { periodic_calls: 0 })).unwrap_err();
        assert_eq!(err, TickError::DuplicateResource("lamp".into()));
        assert_eq!(pool.len(), 1);
    }
}

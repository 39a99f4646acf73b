//! [`Robot`] – wires subsystems, commands and operator bindings into one
//! scheduler.
//!
//! | Input | Edge | Command |
//! |---|---|---|
//! | right trigger | pulled | shooter → `Outtake` |
//! | right trigger | let go | shooter → `Hold` |
//!
//! There is no autonomous routine; [`Robot::autonomous_command`] only logs
//! that fact.

use tickwork_hal::Connector;
use tickwork_kernel::{
    Action, Binding, InstantCommand, PrintCommand, Scheduler, SchedulerConfig,
};
use tickwork_types::{CommandId, ResourceId, SchedulerSnapshot, TickError};
use tracing::info;

use crate::input::{ButtonBoard, RIGHT_TRIGGER};
use crate::subsystems::{
    LEDS, LedConfig, LedSubsystem, MotorSpeed, SHOOTER, ShooterConfig, ShooterSubsystem,
};

/// Message of the placeholder autonomous command.
pub const NO_AUTONOMOUS: &str = "No autonomous command configured";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RobotConfig {
    pub scheduler: SchedulerConfig,
    pub leds: LedConfig,
    pub shooter: ShooterConfig,
}

pub struct Robot {
    scheduler: Scheduler,
    board: ButtonBoard,
    outtake: CommandId,
    hold: CommandId,
    autonomous: CommandId,
}

impl Robot {
    /// Acquire every device through `connector`, then register commands and
    /// bind the operator inputs on `board`.
    ///
    /// Unreachable devices do not fail construction; they show up as
    /// disconnected in [`snapshot`][Self::snapshot].
    ///
    /// # Errors
    ///
    /// Only wiring errors from the scheduler, which indicate a bug here.
    pub fn new(config: RobotConfig, connector: &mut dyn Connector, board: ButtonBoard) -> Result<Self, TickError> {
        let mut scheduler = Scheduler::new(config.scheduler);
        scheduler.register_subsystem(LedSubsystem::new(config.leds, connector))?;
        scheduler.register_subsystem(ShooterSubsystem::new(config.shooter, connector))?;

        let outtake = scheduler.register_command(shooter_speed("shooter-outtake", MotorSpeed::Outtake))?;
        let hold = scheduler.register_command(shooter_speed("shooter-hold", MotorSpeed::Hold))?;
        let autonomous = scheduler.register_command(PrintCommand::new(NO_AUTONOMOUS))?;

        scheduler.bind(
            RIGHT_TRIGGER,
            board.right_trigger(),
            Binding::on_true(outtake).and_on_false(Action::Schedule(hold)),
        )?;

        info!(
            resources = scheduler.resource_ids().len(),
            "robot wired"
        );
        Ok(Self {
            scheduler,
            board,
            outtake,
            hold,
            autonomous,
        })
    }

    /// Advance one tick.
    pub fn tick(&mut self) {
        self.scheduler.run();
    }

    pub fn autonomous_command(&self) -> CommandId {
        self.autonomous
    }

    pub fn start_autonomous(&mut self) -> Result<(), TickError> {
        self.scheduler.schedule(self.autonomous)
    }

    pub fn outtake_command(&self) -> CommandId {
        self.outtake
    }

    pub fn hold_command(&self) -> CommandId {
        self.hold
    }

    /// Interrupt every running command.  Used on shutdown.
    pub fn cancel_all(&mut self) {
        self.scheduler.cancel_all();
    }

    pub fn board(&self) -> &ButtonBoard {
        &self.board
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn shooter(&self) -> Option<&ShooterSubsystem> {
        self.scheduler.subsystem(&ResourceId::from(SHOOTER))
    }

    pub fn leds(&self) -> Option<&LedSubsystem> {
        self.scheduler.subsystem(&ResourceId::from(LEDS))
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.scheduler.snapshot()
    }
}

fn shooter_speed(name: &str, speed: MotorSpeed) -> InstantCommand {
    InstantCommand::new(name, vec![ResourceId::from(SHOOTER)], move |ctx| {
        ctx.subsystem_mut::<ShooterSubsystem>(&ResourceId::from(SHOOTER))?
            .set_speed(speed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwork_hal::{SimConnector, SimWire};
    use tickwork_kernel::RunCommand;
    use tickwork_types::{DevicePayload, TransportSpec};

    fn everything_online() -> SimConnector {
        SimConnector::new([
            TransportSpec::usb("USB1"),
            TransportSpec::usb("USB2"),
            TransportSpec::can(10),
        ])
    }

    fn robot(connector: &mut SimConnector) -> (Robot, SimWire) {
        let wire = connector.wire();
        let robot = Robot::new(RobotConfig::default(), connector, ButtonBoard::new()).unwrap();
        (robot, wire)
    }

    #[test]
    fn right_trigger_drives_the_shooter() {
        let (mut robot, wire) = robot(&mut everything_online());
        let trigger = robot.board().axis(RIGHT_TRIGGER);

        robot.tick();
        assert_eq!(robot.shooter().unwrap().speed(), None);

        trigger.set(1.0);
        robot.tick();
        assert_eq!(robot.shooter().unwrap().speed(), Some(MotorSpeed::Outtake));

        robot.tick();
        trigger.set(0.0);
        robot.tick();
        assert_eq!(robot.shooter().unwrap().speed(), Some(MotorSpeed::Hold));

        assert_eq!(
            wire.sent_to(&TransportSpec::can(10)),
            vec![DevicePayload::MotorOutput(0.8), DevicePayload::MotorOutput(0.1)]
        );
        // Instant commands release the shooter on the tick they run.
        assert_eq!(robot.scheduler().owner_of(&SHOOTER.into()), None);
    }

    #[test]
    fn inert_shooter_is_reported_as_a_fault() {
        let mut connector = SimConnector::new([TransportSpec::usb("USB1")]);
        let (mut robot, _wire) = robot(&mut connector);
        robot.tick();
        robot.board().axis(RIGHT_TRIGGER).set(1.0);
        robot.tick();

        let snapshot = robot.snapshot();
        assert_eq!(snapshot.faults.len(), 1);
        assert!(matches!(
            snapshot.faults[0].error,
            TickError::DeviceDisconnected { .. }
        ));
        let shooter = snapshot
            .resources
            .iter()
            .find(|r| r.id.as_str() == SHOOTER)
            .unwrap();
        assert!(!shooter.devices[0].connected);
    }

    #[test]
    fn autonomous_command_finishes_immediately() {
        let (mut robot, _wire) = robot(&mut everything_online());
        let auto = robot.autonomous_command();
        robot.start_autonomous().unwrap();
        robot.tick();

        assert!(!robot.scheduler().is_running(auto));
        assert_eq!(robot.scheduler().runs(auto), 1);
        assert_eq!(robot.scheduler().command_name(auto), Some("print"));
    }

    #[test]
    fn cancel_all_interrupts_running_work() {
        let (mut robot, _wire) = robot(&mut everything_online());
        let spin = robot
            .scheduler_mut()
            .register_command(RunCommand::new("spin", vec![SHOOTER.into()], |ctx| {
                ctx.subsystem_mut::<ShooterSubsystem>(&SHOOTER.into())?
                    .set_speed(MotorSpeed::Intake)
            }))
            .unwrap();
        robot.scheduler_mut().schedule(spin).unwrap();
        robot.tick();
        assert_eq!(robot.scheduler().owner_of(&SHOOTER.into()), Some(spin));

        robot.cancel_all();
        assert!(robot.scheduler().running().is_empty());
        assert_eq!(robot.scheduler().owner_of(&SHOOTER.into()), None);
    }

    #[test]
    fn leds_are_registered_and_painted() {
        let (robot, wire) = robot(&mut everything_online());
        assert!(robot.leds().unwrap().animate_connected());
        assert!(robot.leds().unwrap().plain_connected());
        assert_eq!(wire.sent_to(&TransportSpec::usb("USB1")).len(), 4);
    }
}

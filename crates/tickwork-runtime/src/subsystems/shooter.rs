//! Shooter subsystem: one motor driven through named speed presets.

use std::any::Any;

use serde::{Deserialize, Serialize};
use tickwork_hal::{Connector, DeviceConfig, MotorController};
use tickwork_kernel::Subsystem;
use tickwork_types::{DeviceStatus, TickError, TransportSpec};
use tracing::{debug, warn};

/// Resource id of the shooter subsystem.
pub const SHOOTER: &str = "shooter";

/// Named shooter speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorSpeed {
    Outtake,
    Hold,
    Intake,
    Stop,
}

impl std::str::FromStr for MotorSpeed {
    type Err = TickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outtake" => Ok(MotorSpeed::Outtake),
            "hold" => Ok(MotorSpeed::Hold),
            "intake" => Ok(MotorSpeed::Intake),
            "stop" => Ok(MotorSpeed::Stop),
            other => Err(TickError::Config(format!("unknown shooter speed '{other}'"))),
        }
    }
}

/// Duty cycle of each preset.  `Stop` is always neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterPresets {
    pub outtake: f32,
    pub hold: f32,
    pub intake: f32,
}

impl Default for ShooterPresets {
    fn default() -> Self {
        Self {
            outtake: 0.8,
            hold: 0.1,
            intake: -0.5,
        }
    }
}

impl ShooterPresets {
    pub fn duty(&self, speed: MotorSpeed) -> f32 {
        match speed {
            MotorSpeed::Outtake => self.outtake,
            MotorSpeed::Hold => self.hold,
            MotorSpeed::Intake => self.intake,
            MotorSpeed::Stop => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShooterConfig {
    pub motor: DeviceConfig,
    pub presets: ShooterPresets,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            motor: DeviceConfig::new("shooter-motor", vec![TransportSpec::can(10)]),
            presets: ShooterPresets::default(),
        }
    }
}

pub struct ShooterSubsystem {
    motor: MotorController,
    presets: ShooterPresets,
    speed: Option<MotorSpeed>,
}

impl ShooterSubsystem {
    /// Acquire the motor.  An unreachable motor leaves the shooter inert.
    pub fn new(config: ShooterConfig, connector: &mut dyn Connector) -> Self {
        let mut motor = MotorController::new(config.motor);
        if let Err(e) = motor.connect(connector) {
            warn!(error = %e, "shooter motor unavailable");
        }
        Self {
            motor,
            presets: config.presets,
            speed: None,
        }
    }

    /// Drive the motor at a preset.
    ///
    /// # Errors
    ///
    /// [`TickError::DeviceDisconnected`] if the motor is inert; the current
    /// speed is left unchanged.
    pub fn set_speed(&mut self, speed: MotorSpeed) -> Result<(), TickError> {
        match speed {
            MotorSpeed::Stop => self.motor.stop()?,
            _ => self.motor.set_output(self.presets.duty(speed))?,
        }
        debug!(?speed, output = self.motor.output(), "shooter speed set");
        self.speed = Some(speed);
        Ok(())
    }

    /// Last preset the motor accepted.
    pub fn speed(&self) -> Option<MotorSpeed> {
        self.speed
    }

    pub fn output(&self) -> f32 {
        self.motor.output()
    }

    pub fn is_connected(&self) -> bool {
        self.motor.is_connected()
    }
}

impl Subsystem for ShooterSubsystem {
    fn id(&self) -> &str {
        SHOOTER
    }

    fn device_status(&self) -> Vec<DeviceStatus> {
        vec![self.motor.status()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwork_hal::SimConnector;
    use tickwork_types::DevicePayload;

    fn shooter() -> (ShooterSubsystem, tickwork_hal::SimWire) {
        let mut connector = SimConnector::new([TransportSpec::can(10)]);
        let wire = connector.wire();
        (ShooterSubsystem::new(ShooterConfig::default(), &mut connector), wire)
    }

    #[test]
    fn presets_map_to_duty_cycles() {
        let (mut shooter, wire) = shooter();
        shooter.set_speed(MotorSpeed::Outtake).unwrap();
        shooter.set_speed(MotorSpeed::Hold).unwrap();
        shooter.set_speed(MotorSpeed::Stop).unwrap();

        assert_eq!(
            wire.sent_to(&TransportSpec::can(10)),
            vec![
                DevicePayload::MotorOutput(0.8),
                DevicePayload::MotorOutput(0.1),
                DevicePayload::Neutral,
            ]
        );
        assert_eq!(shooter.speed(), Some(MotorSpeed::Stop));
        assert_eq!(shooter.output(), 0.0);
    }

    #[test]
    fn inert_shooter_keeps_its_speed() {
        let mut shooter = ShooterSubsystem::new(ShooterConfig::default(), &mut SimConnector::offline());
        assert!(!shooter.is_connected());
        assert!(shooter.set_speed(MotorSpeed::Outtake).is_err());
        assert_eq!(shooter.speed(), None);
        assert!(!shooter.device_status()[0].connected);
    }

    #[test]
    fn speed_names_parse() {
        assert_eq!("Outtake".parse::<MotorSpeed>().unwrap(), MotorSpeed::Outtake);
        assert_eq!(" hold ".parse::<MotorSpeed>().unwrap(), MotorSpeed::Hold);
        assert!("warp".parse::<MotorSpeed>().is_err());
    }

    #[test]
    fn presets_deserialize_with_defaults() {
        let presets: ShooterPresets = serde_json::from_str(r#"{"outtake": 1.0}"#).unwrap();
        assert_eq!(presets.outtake, 1.0);
        assert_eq!(presets.hold, ShooterPresets::default().hold);
    }
}

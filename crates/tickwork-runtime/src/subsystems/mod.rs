//! Concrete subsystems of the robot.
//!
//! - [`led`] – [`LedSubsystem`][led::LedSubsystem]: two LED controllers,
//!   painted with a default pattern at boot.
//! - [`shooter`] – [`ShooterSubsystem`][shooter::ShooterSubsystem]: one
//!   motor driven through named speed presets.

pub mod led;
pub mod shooter;

pub use led::{LEDS, LedConfig, LedSubsystem};
pub use shooter::{MotorSpeed, SHOOTER, ShooterConfig, ShooterPresets, ShooterSubsystem};

//! `tickwork-runtime` – The Robot Program
//!
//! Everything between the kernel and a running process: the fixed-period
//! loop, operator input, the robot's concrete subsystems, and the wiring
//! that ties them to commands.
//!
//! # Modules
//!
//! - [`tick_loop`] – [`TickLoop`][tick_loop::TickLoop]: drives the
//!   scheduler at a fixed period and counts overruns with
//!   [`OverrunMonitor`][tick_loop::OverrunMonitor].
//! - [`input`] – [`ButtonBoard`][input::ButtonBoard]: named buttons and
//!   axes shared lock-free with the tick loop.
//! - [`subsystems`] – the LED and shooter subsystems.
//! - [`robot`] – [`Robot`][robot::Robot]: the container that registers
//!   subsystems and commands and binds the operator controls.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs
//!   the `tracing` subscriber, with optional OTLP span export.

pub mod input;
pub mod robot;
pub mod subsystems;
pub mod telemetry;
pub mod tick_loop;

pub use input::{Axis, Button, ButtonBoard};
pub use robot::{Robot, RobotConfig};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use tick_loop::{OverrunMonitor, TickLoop};

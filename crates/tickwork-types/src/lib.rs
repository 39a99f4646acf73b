use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of an exclusively-ownable resource (subsystem), e.g.
/// `"shooter"` or `"leds"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Handle of a command registered with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub u32);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// Handle of a trigger bound to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(pub u32);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

/// Physical link family a device can be reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Usb,
    Uart,
    Can,
    /// In-process simulated link.
    Sim,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Usb => write!(f, "usb"),
            TransportKind::Uart => write!(f, "uart"),
            TransportKind::Can => write!(f, "can"),
            TransportKind::Sim => write!(f, "sim"),
        }
    }
}

/// One transport candidate for a device: link kind, port/address, and an
/// optional bitrate (baud rate for UART, bus rate for CAN).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportSpec {
    pub kind: TransportKind,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
}

impl TransportSpec {
    pub fn usb(port: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::Usb,
            address: port.into(),
            bitrate: None,
        }
    }

    /// UART at the controller's default baud rate.
    pub fn uart(port: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::Uart,
            address: port.into(),
            bitrate: None,
        }
    }

    pub fn uart_at(port: impl Into<String>, baud: u32) -> Self {
        Self {
            kind: TransportKind::Uart,
            address: port.into(),
            bitrate: Some(baud),
        }
    }

    pub fn can(device_id: u8) -> Self {
        Self {
            kind: TransportKind::Can,
            address: device_id.to_string(),
            bitrate: None,
        }
    }

    pub fn sim(name: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::Sim,
            address: name.into(),
            bitrate: None,
        }
    }
}

impl fmt::Display for TransportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.address)?;
        if let Some(rate) = self.bitrate {
            write!(f, "@{rate}")?;
        }
        Ok(())
    }
}

/// 8-bit RGB colour sent to LED controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const OFF: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Scroll direction for text on an LED matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    #[default]
    Left,
    Right,
}

/// Where an LED command lands: a single named zone or a named group of zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "name", rename_all = "lowercase")]
pub enum LedTarget {
    Zone(String),
    Group(String),
}

impl Default for LedTarget {
    fn default() -> Self {
        LedTarget::Zone(String::new())
    }
}

/// Scrolling-text request for an LED matrix.
///
/// Built once as a plain value and handed to the device in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextScroll {
    pub text: String,
    pub target: LedTarget,
    pub color: Color,
    pub direction: ScrollDirection,
    /// Delay between scroll steps; lower is faster.
    pub delay_ms: u32,
    /// `false` loops forever, `true` scrolls once then stops.
    pub run_once: bool,
}

impl Default for TextScroll {
    fn default() -> Self {
        Self {
            text: String::new(),
            target: LedTarget::default(),
            color: Color::WHITE,
            direction: ScrollDirection::Left,
            delay_ms: 100,
            run_once: false,
        }
    }
}

/// Opaque output handed to a device link. The link's driver owns the wire
/// encoding; the control layer only decides when and by whom it is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum DevicePayload {
    LedColor { target: LedTarget, color: Color },
    LedText(TextScroll),
    /// Normalised motor duty cycle in `-1.0..=1.0`.
    MotorOutput(f32),
    /// Safe state: outputs off.
    Neutral,
}

/// Lifecycle state of one command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandState {
    Initialized,
    Running,
    Finished,
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry snapshots
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub name: String,
    pub connected: bool,
    pub active_transport: Option<TransportSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub id: ResourceId,
    pub owner: Option<CommandId>,
    pub default_command: Option<CommandId>,
    pub devices: Vec<DeviceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStatus {
    pub id: CommandId,
    pub name: String,
    pub state: CommandState,
    pub requirements: Vec<ResourceId>,
}

/// A fault observed while driving the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub tick: u64,
    pub command: Option<CommandId>,
    pub error: TickError,
}

/// Read-only view of the scheduler for an external telemetry publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub tick: u64,
    pub running: Vec<CommandStatus>,
    pub resources: Vec<ResourceStatus>,
    pub faults: Vec<FaultRecord>,
}

/// Error taxonomy for device acquisition, resource ownership, and wiring.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TickError {
    #[error("All {attempted} transport candidate(s) failed for device {device}")]
    AllTransportsFailed { device: String, attempted: usize },

    #[error("Transport {transport} failed: {reason}")]
    TransportFailed {
        transport: TransportSpec,
        reason: String,
    },

    #[error("Device {device} is not connected")]
    DeviceDisconnected { device: String },

    #[error("Resource {resource} is not owned by {caller}")]
    ResourceNotOwned {
        resource: ResourceId,
        caller: CommandId,
    },

    #[error("Unknown resource: {0}")]
    UnknownResource(ResourceId),

    #[error("Unknown command: {0}")]
    UnknownCommand(CommandId),

    #[error("Resource {resource} is not a {expected}")]
    WrongSubsystemType {
        resource: ResourceId,
        expected: String,
    },

    #[error("Resource {0} is already registered")]
    DuplicateResource(ResourceId),

    #[error("Command {command} does not require resource {resource}")]
    RequirementMismatch {
        command: CommandId,
        resource: ResourceId,
    },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}

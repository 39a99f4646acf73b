//! LED subsystem: an animation-capable controller plus a plain one.
//!
//! Both controllers are acquired once, at construction.  The animate
//! controller sits on a fixed USB port; the plain controller may be wired
//! over USB or the MXP UART, at the default or the fast baud rate, and is
//! tried in that order.  Whichever fails to connect stays inert for the rest
//! of the boot and shows up as disconnected in telemetry.
//!
//! Once connected, the animate controller is painted with the boot pattern
//! from [`LedSubsystem::paint_boot_pattern`].

use std::any::Any;

use tickwork_hal::{Connector, DeviceConfig, LedController};
use tickwork_kernel::Subsystem;
use tickwork_types::{
    Color, DeviceStatus, LedTarget, ScrollDirection, TextScroll, TickError, TransportSpec,
};
use tracing::{info, warn};

/// Resource id of the LED subsystem.
pub const LEDS: &str = "leds";

/// Fast baud rate the plain controller supports on the MXP UART.
pub const MXP_FAST_BAUD: u32 = 230_400;

#[derive(Debug, Clone, PartialEq)]
pub struct LedConfig {
    pub animate: DeviceConfig,
    pub plain: DeviceConfig,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            animate: DeviceConfig::new("connector-x-animate", vec![TransportSpec::usb("USB1")]),
            plain: DeviceConfig::new(
                "connector-x",
                vec![
                    TransportSpec::usb("USB2"),
                    TransportSpec::uart("MXP"),
                    TransportSpec::uart_at("MXP", MXP_FAST_BAUD),
                ],
            ),
        }
    }
}

pub struct LedSubsystem {
    animate: LedController,
    plain: LedController,
}

impl LedSubsystem {
    /// Acquire both controllers and paint the boot pattern.
    ///
    /// Never fails: a controller that cannot be reached is left inert.
    pub fn new(config: LedConfig, connector: &mut dyn Connector) -> Self {
        let mut animate = LedController::new(config.animate);
        let mut plain = LedController::new(config.plain);

        if let Err(e) = animate.connect(connector) {
            warn!(error = %e, "animate LED controller unavailable");
        }
        if let Err(e) = plain.connect(connector) {
            warn!(error = %e, "plain LED controller unavailable");
        }

        let mut leds = Self { animate, plain };
        if leds.animate.is_connected() {
            match leds.paint_boot_pattern() {
                Ok(()) => info!("LED boot pattern painted"),
                Err(e) => warn!(error = %e, "LED boot pattern failed"),
            }
        }
        leds
    }

    /// Left climber red, all climbers green, and two looping text scrolls.
    ///
    /// # Errors
    ///
    /// [`TickError::DeviceDisconnected`] if the animate controller is inert.
    pub fn paint_boot_pattern(&mut self) -> Result<(), TickError> {
        self.animate.set_color("left-climber", Color::RED)?;
        self.animate.set_group_color("all-climbers", Color::GREEN)?;
        self.animate.scroll_text(&TextScroll {
            text: "Hello World!".into(),
            target: LedTarget::Zone("front-matrix".into()),
            color: Color::WHITE,
            direction: ScrollDirection::Left,
            delay_ms: 300,
            run_once: false,
        })?;
        self.animate.scroll_text(&TextScroll {
            text: "Hello!".into(),
            target: LedTarget::Group("all-matrices".into()),
            color: Color::YELLOW,
            direction: ScrollDirection::Right,
            delay_ms: 500,
            run_once: false,
        })
    }

    pub fn set_color(&mut self, zone: &str, color: Color) -> Result<(), TickError> {
        self.animate.set_color(zone, color)
    }

    pub fn set_group_color(&mut self, group: &str, color: Color) -> Result<(), TickError> {
        self.animate.set_group_color(group, color)
    }

    pub fn scroll_text(&mut self, scroll: &TextScroll) -> Result<(), TickError> {
        self.animate.scroll_text(scroll)
    }

    /// Solid colour on a zone of the plain controller.
    pub fn set_plain_color(&mut self, zone: &str, color: Color) -> Result<(), TickError> {
        self.plain.set_color(zone, color)
    }

    /// Blank both controllers.  Inert controllers are skipped.
    pub fn clear(&mut self) -> Result<(), TickError> {
        if self.animate.is_connected() {
            self.animate.clear()?;
        }
        if self.plain.is_connected() {
            self.plain.clear()?;
        }
        Ok(())
    }

    pub fn animate_connected(&self) -> bool {
        self.animate.is_connected()
    }

    pub fn plain_connected(&self) -> bool {
        self.plain.is_connected()
    }
}

impl Subsystem for LedSubsystem {
    fn id(&self) -> &str {
        LEDS
    }

    fn device_status(&self) -> Vec<DeviceStatus> {
        vec![self.animate.status(), self.plain.status()]
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

    #[test]
    fn plain_controller_falls_back_to_uart() {
        let mut connector = SimConnector::new([TransportSpec::usb("USB1"), TransportSpec::uart("MXP")]);
        let leds = LedSubsystem::new(LedConfig::default(), &mut connector);

        assert!(leds.animate_connected());
        assert!(leds.plain_connected());
        assert_eq!(
            connector.attempts(),
            &[TransportSpec::usb("USB1"), TransportSpec::usb("USB2"), TransportSpec::uart("MXP")]
        );
        let status = leds.device_status();
        assert_eq!(status[1].active_transport, Some(TransportSpec::uart("MXP")));
    }

    #[test]
    fn fast_uart_is_the_last_resort() {
        let fast = TransportSpec::uart_at("MXP", MXP_FAST_BAUD);
        let mut connector = SimConnector::new([fast.clone()]);
        let leds = LedSubsystem::new(LedConfig::default(), &mut connector);

        assert!(!leds.animate_connected());
        assert_eq!(leds.device_status()[1].active_transport, Some(fast));
    }

    #[test]
    fn boot_pattern_goes_to_the_animate_controller() {
        let usb1 = TransportSpec::usb("USB1");
        let mut connector = SimConnector::new([usb1.clone()]);
        let wire = connector.wire();
        let _leds = LedSubsystem::new(LedConfig::default(), &mut connector);

        let sent = wire.sent_to(&usb1);
        assert_eq!(sent.len(), 4);
        assert_eq!(
            sent[0],
            DevicePayload::LedColor {
                target: LedTarget::Zone("left-climber".into()),
                color: Color::RED,
            }
        );
        match &sent[2] {
            DevicePayload::LedText(scroll) => {
                assert_eq!(scroll.text, "Hello World!");
                assert_eq!(scroll.delay_ms, 300);
                assert!(!scroll.run_once);
            }
            other => panic!("expected text scroll, got {other:?}"),
        }
        match &sent[3] {
            DevicePayload::LedText(scroll) => {
                assert_eq!(scroll.target, LedTarget::Group("all-matrices".into()));
                assert_eq!(scroll.direction, ScrollDirection::Right);
                assert_eq!(scroll.color, Color::YELLOW);
            }
            other => panic!("expected text scroll, got {other:?}"),
        }
    }

    #[test]
    fn offline_leds_construct_and_stay_inert() {
        let mut connector = SimConnector::offline();
        let mut leds = LedSubsystem::new(LedConfig::default(), &mut connector);

        assert!(!leds.animate_connected());
        assert!(!leds.plain_connected());
        assert!(leds.device_status().iter().all(|d| !d.connected));
        assert!(matches!(
            leds.set_color("left-climber", Color::RED),
            Err(TickError::DeviceDisconnected { .. })
        ));
        // Nothing connected, nothing to blank.
        assert!(leds.clear().is_ok());
        assert!(connector.wire().sent().is_empty());
    }
}

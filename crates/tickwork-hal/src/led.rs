//! LED controller device: solid colours per zone or group, and scrolling text
//! on LED matrices.
//!
//! Zones and groups are named in the controller's own configuration tool; the
//! control layer just refers to them by name.

use tickwork_types::{
    Color, DevicePayload, DeviceStatus, LedTarget, TextScroll, TickError,
};

use crate::device::{ConnectionResult, DeviceConfig, DeviceHandle};
use crate::transport::Connector;

/// An addressable-LED controller reached through a [`DeviceHandle`].
#[derive(Debug)]
pub struct LedController {
    handle: DeviceHandle,
}

impl LedController {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            handle: DeviceHandle::new(config),
        }
    }

    /// Acquire the controller; see [`DeviceHandle::connect`].
    pub fn connect(&mut self, connector: &mut dyn Connector) -> ConnectionResult {
        self.handle.connect(connector)
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    /// Paint one named zone a solid colour.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] while the controller is inert.
    pub fn set_color(&mut self, zone: &str, color: Color) -> Result<(), TickError> {
        self.handle.send(&DevicePayload::LedColor {
            target: LedTarget::Zone(zone.to_string()),
            color,
        })
    }

    /// Paint every zone of a named group a solid colour.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] while the controller is inert.
    pub fn set_group_color(&mut self, group: &str, color: Color) -> Result<(), TickError> {
        self.handle.send(&DevicePayload::LedColor {
            target: LedTarget::Group(group.to_string()),
            color,
        })
    }

    /// Start scrolling text on a matrix zone or group.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] while the controller is inert.
    pub fn scroll_text(&mut self, scroll: &TextScroll) -> Result<(), TickError> {
        self.handle.send(&DevicePayload::LedText(scroll.clone()))
    }

    /// Blank every output.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] while the controller is inert.
    pub fn clear(&mut self) -> Result<(), TickError> {
        self.handle.send(&DevicePayload::Neutral)
    }

    pub fn status(&self) -> DeviceStatus {
        self.handle.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConnector;
    use tickwork_types::{ScrollDirection, TransportSpec};

    #[test]
    fn colours_are_addressed_by_zone_and_group() {
        let usb = TransportSpec::usb("USB1");
        let mut connector = SimConnector::new([usb.clone()]);
        let wire = connector.wire();
        let mut leds = LedController::new(DeviceConfig::new("animate", vec![usb.clone()]));
        leds.connect(&mut connector).unwrap();

        leds.set_color("left-climber", Color::RED).unwrap();
        leds.set_group_color("all-climbers", Color::GREEN).unwrap();

        assert_eq!(
            wire.sent_to(&usb),
            vec![
                DevicePayload::LedColor {
                    target: LedTarget::Zone("left-climber".into()),
                    color: Color::RED,
                },
                DevicePayload::LedColor {
                    target: LedTarget::Group("all-climbers".into()),
                    color: Color::GREEN,
                },
            ]
        );
    }

    #[test]
    fn scroll_text_carries_the_whole_request() {
        let usb = TransportSpec::usb("USB1");
        let mut connector = SimConnector::new([usb.clone()]);
        let wire = connector.wire();
        let mut leds = LedController::new(DeviceConfig::new("animate", vec![usb.clone()]));
        leds.connect(&mut connector).unwrap();

        let scroll = TextScroll {
            text: "Hello!".into(),
            target: LedTarget::Group("all-matrices".into()),
            color: Color::YELLOW,
            direction: ScrollDirection::Right,
            delay_ms: 500,
            run_once: false,
        };
        leds.scroll_text(&scroll).unwrap();
        assert_eq!(wire.sent_to(&usb), vec![DevicePayload::LedText(scroll)]);
    }

    #[test]
    fn inert_controller_rejects_output() {
        let mut connector = SimConnector::offline();
        let mut leds = LedController::new(DeviceConfig::new(
            "cx",
            vec![TransportSpec::usb("USB2")],
        ));
        assert!(leds.connect(&mut connector).is_err());
        assert!(matches!(
            leds.set_color("left-climber", Color::RED),
            Err(TickError::DeviceDisconnected { .. })
        ));
        assert!(!leds.status().connected);
    }
}

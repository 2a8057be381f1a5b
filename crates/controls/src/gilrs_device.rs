//! gilrs gamepad backend
//!
//! Only compiled when `gamepad` feature is enabled.

use contracts::{AxisName, ButtonName, InputConfig};
use gilrs::{Axis, Button, Gamepad, GamepadId, Gilrs};
use tracing::{debug, info, instrument, trace};

use crate::device::InputDevice;
use crate::error::{InputError, Result};
use crate::mapping::InputSnapshot;

/// Physical joystick read through gilrs
///
/// Exposes the gamepad as ordered axis / button lists so the index based
/// mapping in [`map_controls`](crate::map_controls) applies unchanged.
pub struct GilrsJoystick {
    gilrs: Gilrs,
    id: GamepadId,
    name: String,
    axis_order: Vec<AxisName>,
    button_order: Vec<ButtonName>,
    released: bool,
}

impl GilrsJoystick {
    /// Open the `device_index`-th connected gamepad
    ///
    /// Fails with [`InputError::NoDevice`] when fewer gamepads are connected.
    #[instrument(name = "gilrs_open", skip(config), fields(device_index = config.device_index))]
    pub fn open(config: &InputConfig) -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Backend {
            message: format!("failed to initialize gilrs: {e}"),
        })?;

        let connected: Vec<(GamepadId, String)> = gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        let (id, name) = connected
            .get(config.device_index)
            .cloned()
            .ok_or(InputError::NoDevice {
                index: config.device_index,
                connected: connected.len(),
            })?;

        info!(name = %name, connected = connected.len(), "joystick opened");

        Ok(Self {
            gilrs,
            id,
            name,
            axis_order: config.axis_order.clone(),
            button_order: config.button_order.clone(),
            released: false,
        })
    }

    fn read_axis(gamepad: &Gamepad<'_>, axis: AxisName) -> f32 {
        match axis {
            // 扳机在 gilrs 中是模拟按键 [0, 1]，映射回 [-1, 1]；未按下时为 -1
            AxisName::LeftTrigger2 => trigger(gamepad, Button::LeftTrigger2),
            AxisName::RightTrigger2 => trigger(gamepad, Button::RightTrigger2),
            other => gamepad.value(to_gilrs_axis(other)),
        }
    }
}

fn trigger(gamepad: &Gamepad<'_>, button: Button) -> f32 {
    gamepad
        .button_data(button)
        .map(|data| data.value() * 2.0 - 1.0)
        .unwrap_or(-1.0)
}

fn to_gilrs_axis(axis: AxisName) -> Axis {
    match axis {
        AxisName::LeftStickX => Axis::LeftStickX,
        AxisName::LeftStickY => Axis::LeftStickY,
        AxisName::RightStickX => Axis::RightStickX,
        AxisName::RightStickY => Axis::RightStickY,
        AxisName::LeftZ => Axis::LeftZ,
        AxisName::RightZ => Axis::RightZ,
        AxisName::DPadX => Axis::DPadX,
        AxisName::DPadY => Axis::DPadY,
        AxisName::LeftTrigger2 | AxisName::RightTrigger2 => Axis::Unknown,
    }
}

fn to_gilrs_button(button: ButtonName) -> Button {
    match button {
        ButtonName::South => Button::South,
        ButtonName::East => Button::East,
        ButtonName::North => Button::North,
        ButtonName::West => Button::West,
        ButtonName::LeftTrigger => Button::LeftTrigger,
        ButtonName::RightTrigger => Button::RightTrigger,
        ButtonName::LeftTrigger2 => Button::LeftTrigger2,
        ButtonName::RightTrigger2 => Button::RightTrigger2,
        ButtonName::Select => Button::Select,
        ButtonName::Start => Button::Start,
        ButtonName::Mode => Button::Mode,
        ButtonName::LeftThumb => Button::LeftThumb,
        ButtonName::RightThumb => Button::RightThumb,
        ButtonName::DPadUp => Button::DPadUp,
        ButtonName::DPadDown => Button::DPadDown,
        ButtonName::DPadLeft => Button::DPadLeft,
        ButtonName::DPadRight => Button::DPadRight,
    }
}

impl InputDevice for GilrsJoystick {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        // Drain pending events so gamepad state is current
        while let Some(event) = self.gilrs.next_event() {
            trace!(event = ?event.event, "gamepad event");
        }

        let gamepad = self
            .gilrs
            .connected_gamepad(self.id)
            .ok_or_else(|| InputError::Disconnected {
                name: self.name.clone(),
            })?;

        let axes = self
            .axis_order
            .iter()
            .map(|&axis| Self::read_axis(&gamepad, axis))
            .collect();
        let buttons = self
            .button_order
            .iter()
            .map(|&button| gamepad.is_pressed(to_gilrs_button(button)))
            .collect();

        Ok(InputSnapshot { axes, buttons })
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            debug!(name = %self.name, "joystick released");
        }
    }
}

use brickline_frame::{DeviceType, InputPort};
use serde::Serialize;

/// Last known reading of one input port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub port: InputPort,
    /// Position in polling order, 0..=7.
    pub index: usize,
    pub device_type: DeviceType,
    pub mode: u8,
    pub si_value: f32,
    pub raw_value: i32,
    pub percent_value: u8,
}

impl Port {
    pub fn new(port: InputPort) -> Self {
        Self {
            port,
            index: port.index(),
            device_type: DeviceType::default(),
            mode: 0,
            si_value: 0.0,
            raw_value: 0,
            percent_value: 0,
        }
    }
}

/// Pressed state of the six brick buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ButtonSet {
    pub back: bool,
    pub left: bool,
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub enter: bool,
}

impl ButtonSet {
    /// Flags in poll-reply order: back, left, up, right, down, enter.
    pub fn from_flags(flags: [bool; 6]) -> Self {
        let [back, left, up, right, down, enter] = flags;
        Self {
            back,
            left,
            up,
            right,
            down,
            enter,
        }
    }

    pub fn any_pressed(&self) -> bool {
        self.back || self.left || self.up || self.right || self.down || self.enter
    }
}

/// Cached brick state, replaced as a whole by each poll round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    pub ports: [Port; 8],
    pub buttons: ButtonSet,
}

impl DeviceState {
    pub fn port(&self, port: InputPort) -> &Port {
        &self.ports[port.index()]
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            ports: InputPort::ALL.map(Port::new),
            buttons: ButtonSet::default(),
        }
    }
}

/// Full device state as of one poll round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSnapshot {
    pub ports: [Port; 8],
    pub buttons: ButtonSet,
}

impl ChangeSnapshot {
    pub fn port(&self, port: InputPort) -> &Port {
        &self.ports[port.index()]
    }
}

impl From<&DeviceState> for ChangeSnapshot {
    fn from(state: &DeviceState) -> Self {
        Self {
            ports: state.ports.clone(),
            buttons: state.buttons,
        }
    }
}

//! Registry of the protocol codes brickline uses.
//!
//! This is not the full firmware opcode table, only the entries the
//! builders in this crate emit or the decoder recognizes.

use serde::Serialize;

/// Largest global reply buffer a direct command may request.
pub const MAX_GLOBAL_SIZE: usize = 1024;

/// Largest local variable buffer a direct command may request.
pub const MAX_LOCAL_SIZE: usize = 64;

/// Layer byte for a single (non daisy-chained) brick.
pub const LAYER: u8 = 0x00;

/// Command kind byte, sent right after the sequence id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    DirectReply = 0x00,
    SystemReply = 0x01,
    DirectNoReply = 0x80,
    SystemNoReply = 0x81,
}

impl CommandKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether the brick answers this kind of command.
    pub fn expects_reply(self) -> bool {
        matches!(self, CommandKind::DirectReply | CommandKind::SystemReply)
    }

    /// Direct commands carry a memory header; system commands do not.
    pub fn is_direct(self) -> bool {
        matches!(self, CommandKind::DirectReply | CommandKind::DirectNoReply)
    }
}

/// Reply kind byte of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    DirectOk,
    SystemOk,
    DirectError,
    SystemError,
    /// Any byte the registry does not know.
    Unrecognized(u8),
}

impl ReplyKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x02 => ReplyKind::DirectOk,
            0x03 => ReplyKind::SystemOk,
            0x04 => ReplyKind::DirectError,
            0x05 => ReplyKind::SystemError,
            other => ReplyKind::Unrecognized(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ReplyKind::DirectOk => 0x02,
            ReplyKind::SystemOk => 0x03,
            ReplyKind::DirectError => 0x04,
            ReplyKind::SystemError => 0x05,
            ReplyKind::Unrecognized(code) => code,
        }
    }

    pub fn is_direct(self) -> bool {
        matches!(self, ReplyKind::DirectOk | ReplyKind::DirectError)
    }

    pub fn is_system(self) -> bool {
        matches!(self, ReplyKind::SystemOk | ReplyKind::SystemError)
    }

    pub fn is_error(self) -> bool {
        matches!(self, ReplyKind::DirectError | ReplyKind::SystemError)
    }
}

/// Direct-command opcodes. Values above `0xFF` carry a sub-command in the
/// low byte and are written as two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    UiWriteLed = 0x821B,
    UiButtonPressed = 0x8309,
    SoundBreak = 0x9400,
    SoundTone = 0x9401,
    SoundPlay = 0x9402,
    InputDeviceGetTypeMode = 0x9905,
    InputDeviceClearAll = 0x990A,
    InputDeviceClearChanges = 0x991A,
    InputDeviceReadyPercent = 0x991B,
    InputDeviceReadyRaw = 0x991C,
    InputDeviceReadySi = 0x991D,
    OutputStop = 0xA3,
    OutputPower = 0xA4,
    OutputSpeed = 0xA5,
    OutputStart = 0xA6,
    OutputPolarity = 0xA7,
    OutputStepPower = 0xAC,
    OutputTimePower = 0xAD,
    OutputStepSpeed = 0xAE,
    OutputTimeSpeed = 0xAF,
    OutputStepSync = 0xB0,
    OutputTimeSync = 0xB1,
    OutputClearCount = 0xB2,
}

impl Opcode {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// System-command opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum SystemOpcode {
    BeginDownload = 0x92,
    ContinueDownload = 0x93,
    BeginUpload = 0x94,
    ContinueUpload = 0x95,
    BeginGetFile = 0x96,
    ContinueGetFile = 0x97,
    CloseFileHandle = 0x98,
    ListFiles = 0x99,
    ContinueListFiles = 0x9A,
    CreateDirectory = 0x9B,
    DeleteFile = 0x9C,
    ListOpenHandles = 0x9D,
    WriteMailbox = 0x9E,
    BluetoothPin = 0x9F,
    EnterFirmwareUpdate = 0xA0,
}

impl SystemOpcode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        use SystemOpcode::*;
        Some(match code {
            0x92 => BeginDownload,
            0x93 => ContinueDownload,
            0x94 => BeginUpload,
            0x95 => ContinueUpload,
            0x96 => BeginGetFile,
            0x97 => ContinueGetFile,
            0x98 => CloseFileHandle,
            0x99 => ListFiles,
            0x9A => ContinueListFiles,
            0x9B => CreateDirectory,
            0x9C => DeleteFile,
            0x9D => ListOpenHandles,
            0x9E => WriteMailbox,
            0x9F => BluetoothPin,
            0xA0 => EnterFirmwareUpdate,
            _ => return None,
        })
    }
}

/// Status byte of a system reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum SystemStatus {
    Success = 0x00,
    UnknownHandle = 0x01,
    HandleNotReady = 0x02,
    CorruptFile = 0x03,
    NoHandlesAvailable = 0x04,
    NoPermission = 0x05,
    IllegalPath = 0x06,
    FileExists = 0x07,
    EndOfFile = 0x08,
    SizeError = 0x09,
    UnknownError = 0x0A,
    IllegalFilename = 0x0B,
    IllegalConnection = 0x0C,
}

impl SystemStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        use SystemStatus::*;
        Some(match code {
            0x00 => Success,
            0x01 => UnknownHandle,
            0x02 => HandleNotReady,
            0x03 => CorruptFile,
            0x04 => NoHandlesAvailable,
            0x05 => NoPermission,
            0x06 => IllegalPath,
            0x07 => FileExists,
            0x08 => EndOfFile,
            0x09 => SizeError,
            0x0A => UnknownError,
            0x0B => IllegalFilename,
            0x0C => IllegalConnection,
            _ => return None,
        })
    }
}

/// Sensor input ports. Motor ports double as inputs for tacho readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum InputPort {
    One = 0x00,
    Two = 0x01,
    Three = 0x02,
    Four = 0x03,
    A = 0x10,
    B = 0x11,
    C = 0x12,
    D = 0x13,
}

impl InputPort {
    /// All input ports in polling order.
    pub const ALL: [InputPort; 8] = [
        InputPort::One,
        InputPort::Two,
        InputPort::Three,
        InputPort::Four,
        InputPort::A,
        InputPort::B,
        InputPort::C,
        InputPort::D,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Ordinal position in [`InputPort::ALL`].
    pub fn index(self) -> usize {
        match self {
            InputPort::One => 0,
            InputPort::Two => 1,
            InputPort::Three => 2,
            InputPort::Four => 3,
            InputPort::A => 4,
            InputPort::B => 5,
            InputPort::C => 6,
            InputPort::D => 7,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            InputPort::One => "1",
            InputPort::Two => "2",
            InputPort::Three => "3",
            InputPort::Four => "4",
            InputPort::A => "A",
            InputPort::B => "B",
            InputPort::C => "C",
            InputPort::D => "D",
        }
    }
}

/// Motor output ports as a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputPort(u8);

impl OutputPort {
    pub const A: OutputPort = OutputPort(0x01);
    pub const B: OutputPort = OutputPort(0x02);
    pub const C: OutputPort = OutputPort(0x04);
    pub const D: OutputPort = OutputPort(0x08);
    pub const ALL: OutputPort = OutputPort(0x0F);

    /// Build a port set from raw bits; bits above `D` are dropped.
    pub fn from_bits(bits: u8) -> Self {
        OutputPort(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a port list such as `"ABD"` or `"all"`.
    pub fn parse(input: &str) -> Option<Self> {
        if input.eq_ignore_ascii_case("all") {
            return Some(Self::ALL);
        }
        let mut bits = 0u8;
        for ch in input.chars() {
            bits |= match ch.to_ascii_uppercase() {
                'A' => Self::A.0,
                'B' => Self::B.0,
                'C' => Self::C.0,
                'D' => Self::D.0,
                _ => return None,
            };
        }
        (bits != 0).then_some(OutputPort(bits))
    }
}

impl std::ops::BitOr for OutputPort {
    type Output = OutputPort;

    fn bitor(self, rhs: OutputPort) -> OutputPort {
        OutputPort(self.0 | rhs.0)
    }
}

/// Device attached to an input port, as reported by get-type-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(u8)]
pub enum DeviceType {
    NxtTouch = 1,
    NxtLight = 2,
    NxtSound = 3,
    NxtColor = 4,
    NxtUltrasonic = 5,
    NxtTemperature = 6,
    LargeMotor = 7,
    MediumMotor = 8,
    Touch = 16,
    Color = 29,
    Ultrasonic = 30,
    Gyroscope = 32,
    Infrared = 33,
    Initializing = 0x7D,
    Empty = 0x7E,
    WrongPort = 0x7F,
    #[default]
    Unknown = 0xFF,
}

impl DeviceType {
    /// Map a type code; anything unregistered reads as `Unknown`.
    pub fn from_code(code: u8) -> Self {
        use DeviceType::*;
        match code {
            1 => NxtTouch,
            2 => NxtLight,
            3 => NxtSound,
            4 => NxtColor,
            5 => NxtUltrasonic,
            6 => NxtTemperature,
            7 => LargeMotor,
            8 => MediumMotor,
            16 => Touch,
            29 => Color,
            30 => Ultrasonic,
            32 => Gyroscope,
            33 => Infrared,
            0x7D => Initializing,
            0x7E => Empty,
            0x7F => WrongPort,
            _ => Unknown,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Buttons on the face of the brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BrickButton {
    Up = 1,
    Enter = 2,
    Down = 3,
    Right = 4,
    Left = 5,
    Back = 6,
}

/// Status light patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LedPattern {
    Black = 0,
    Green = 1,
    Red = 2,
    Orange = 3,
    GreenFlash = 4,
    RedFlash = 5,
    OrangeFlash = 6,
    GreenPulse = 7,
    RedPulse = 8,
    OrangePulse = 9,
}

/// Motor direction multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Polarity {
    Backward = -1,
    Opposite = 0,
    Forward = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_kind_codes() {
        assert_eq!(ReplyKind::from_code(0x02), ReplyKind::DirectOk);
        assert_eq!(ReplyKind::from_code(0x05), ReplyKind::SystemError);
        assert_eq!(ReplyKind::from_code(0x42), ReplyKind::Unrecognized(0x42));
        assert_eq!(ReplyKind::from_code(0x03).code(), 0x03);
        assert!(ReplyKind::DirectError.is_error());
        assert!(!ReplyKind::Unrecognized(0x09).is_direct());
        assert!(!ReplyKind::Unrecognized(0x09).is_system());
    }

    #[test]
    fn command_kind_reply_expectation() {
        assert!(CommandKind::DirectReply.expects_reply());
        assert!(CommandKind::SystemReply.expects_reply());
        assert!(!CommandKind::DirectNoReply.expects_reply());
        assert!(!CommandKind::SystemNoReply.expects_reply());
        assert!(CommandKind::DirectNoReply.is_direct());
        assert!(!CommandKind::SystemReply.is_direct());
    }

    #[test]
    fn system_codes_cover_registry() {
        for code in 0x92..=0xA0u8 {
            let op = SystemOpcode::from_code(code).expect("registered opcode");
            assert_eq!(op.code(), code);
        }
        assert!(SystemOpcode::from_code(0x91).is_none());
        for code in 0x00..=0x0Cu8 {
            assert_eq!(SystemStatus::from_code(code).map(SystemStatus::code), Some(code));
        }
        assert!(SystemStatus::from_code(0x0D).is_none());
    }

    #[test]
    fn unknown_device_codes_fall_back() {
        assert_eq!(DeviceType::from_code(7), DeviceType::LargeMotor);
        assert_eq!(DeviceType::from_code(0x7E), DeviceType::Empty);
        assert_eq!(DeviceType::from_code(50), DeviceType::Unknown);
        assert_eq!(DeviceType::from_code(0xFF), DeviceType::Unknown);
    }

    #[test]
    fn registry_values_serialize_by_name() {
        assert_eq!(
            serde_json::to_string(&DeviceType::LargeMotor).unwrap(),
            "\"LargeMotor\""
        );
        assert_eq!(
            serde_json::to_string(&SystemStatus::FileExists).unwrap(),
            "\"FileExists\""
        );
    }

    #[test]
    fn input_port_indices_follow_poll_order() {
        for (idx, port) in InputPort::ALL.iter().enumerate() {
            assert_eq!(port.index(), idx);
        }
        assert_eq!(InputPort::C.code(), 0x12);
    }

    #[test]
    fn output_port_parsing() {
        assert_eq!(OutputPort::parse("all"), Some(OutputPort::ALL));
        assert_eq!(OutputPort::parse("ad"), Some(OutputPort::A | OutputPort::D));
        assert_eq!(OutputPort::parse("x"), None);
        assert_eq!(OutputPort::parse(""), None);
        assert_eq!(OutputPort::from_bits(0xFF), OutputPort::ALL);
    }
}

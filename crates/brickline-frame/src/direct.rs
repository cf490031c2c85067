//! Direct-command operations.
//!
//! Builder methods append one operation to a command in progress, so any
//! number of them can be batched into one frame. The free functions wrap
//! the common single-operation, no-reply cases.

use crate::command::{Command, CommandBuilder};
use crate::error::Result;
use crate::opcode::{
    BrickButton, InputPort, LedPattern, Opcode, OutputPort, Polarity, LAYER,
};

/// Mode byte that leaves a sensor in its current mode.
pub const KEEP_MODE: u8 = 0xFF;

impl CommandBuilder {
    /// Stop motors on `ports`, braking or coasting.
    pub fn stop_motor(&mut self, ports: OutputPort, brake: bool) -> &mut Self {
        self.opcode(Opcode::OutputStop)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(brake as u8)
    }

    /// Start motors on `ports` with their configured power or speed.
    pub fn start_motor(&mut self, ports: OutputPort) -> &mut Self {
        self.opcode(Opcode::OutputStart).byte(LAYER).byte(ports.bits())
    }

    /// Set open-loop power (-100..=100) without starting.
    pub fn set_motor_power(&mut self, ports: OutputPort, power: i8) -> &mut Self {
        self.opcode(Opcode::OutputPower)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(power as u8)
    }

    /// Set regulated speed (-100..=100) without starting.
    pub fn set_motor_speed(&mut self, ports: OutputPort, speed: i8) -> &mut Self {
        self.opcode(Opcode::OutputSpeed)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(speed as u8)
    }

    /// Set power and start in one batch.
    pub fn turn_motor_at_power(&mut self, ports: OutputPort, power: i8) -> &mut Self {
        self.set_motor_power(ports, power).start_motor(ports)
    }

    /// Set speed and start in one batch.
    pub fn turn_motor_at_speed(&mut self, ports: OutputPort, speed: i8) -> &mut Self {
        self.set_motor_speed(ports, speed).start_motor(ports)
    }

    /// Run a ramped profile measured in tacho steps at open-loop power.
    pub fn step_motor_at_power(
        &mut self,
        ports: OutputPort,
        power: i8,
        ramp_up: u32,
        constant: u32,
        ramp_down: u32,
        brake: bool,
    ) -> &mut Self {
        self.opcode(Opcode::OutputStepPower)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(power as u8)
            .uint(ramp_up)
            .uint(constant)
            .uint(ramp_down)
            .byte(brake as u8)
    }

    /// Run a ramped profile measured in tacho steps at regulated speed.
    pub fn step_motor_at_speed(
        &mut self,
        ports: OutputPort,
        speed: i8,
        ramp_up: u32,
        constant: u32,
        ramp_down: u32,
        brake: bool,
    ) -> &mut Self {
        self.opcode(Opcode::OutputStepSpeed)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(speed as u8)
            .uint(ramp_up)
            .uint(constant)
            .uint(ramp_down)
            .byte(brake as u8)
    }

    /// Run a ramped profile measured in milliseconds at open-loop power.
    pub fn time_motor_at_power(
        &mut self,
        ports: OutputPort,
        power: i8,
        ramp_up_ms: u32,
        constant_ms: u32,
        ramp_down_ms: u32,
        brake: bool,
    ) -> &mut Self {
        self.opcode(Opcode::OutputTimePower)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(power as u8)
            .uint(ramp_up_ms)
            .uint(constant_ms)
            .uint(ramp_down_ms)
            .byte(brake as u8)
    }

    /// Run a ramped profile measured in milliseconds at regulated speed.
    pub fn time_motor_at_speed(
        &mut self,
        ports: OutputPort,
        speed: i8,
        ramp_up_ms: u32,
        constant_ms: u32,
        ramp_down_ms: u32,
        brake: bool,
    ) -> &mut Self {
        self.opcode(Opcode::OutputTimeSpeed)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(speed as u8)
            .uint(ramp_up_ms)
            .uint(constant_ms)
            .uint(ramp_down_ms)
            .byte(brake as u8)
    }

    /// Drive two motors in sync; `turn_ratio` is -200..=200.
    pub fn step_motor_sync(
        &mut self,
        ports: OutputPort,
        speed: i8,
        turn_ratio: i16,
        steps: u32,
        brake: bool,
    ) -> &mut Self {
        self.opcode(Opcode::OutputStepSync)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(speed as u8)
            .short(turn_ratio)
            .uint(steps)
            .byte(brake as u8)
    }

    /// Drive two motors in sync for `time_ms` milliseconds.
    pub fn time_motor_sync(
        &mut self,
        ports: OutputPort,
        speed: i8,
        turn_ratio: i16,
        time_ms: u32,
        brake: bool,
    ) -> &mut Self {
        self.opcode(Opcode::OutputTimeSync)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(speed as u8)
            .short(turn_ratio)
            .uint(time_ms)
            .byte(brake as u8)
    }

    pub fn set_motor_polarity(&mut self, ports: OutputPort, polarity: Polarity) -> &mut Self {
        self.opcode(Opcode::OutputPolarity)
            .byte(LAYER)
            .byte(ports.bits())
            .byte(polarity as i8 as u8)
    }

    /// Reset tacho counts on `ports`.
    pub fn clear_motor_count(&mut self, ports: OutputPort) -> &mut Self {
        self.opcode(Opcode::OutputClearCount)
            .byte(LAYER)
            .byte(ports.bits())
    }

    /// Play a tone; volume 0..=100.
    pub fn play_tone(&mut self, volume: u8, frequency: u16, duration_ms: u16) -> &mut Self {
        self.opcode(Opcode::SoundTone)
            .byte(volume.min(100))
            .short(frequency as i16)
            .short(duration_ms as i16)
    }

    /// Play a sound file stored on the brick (path without `.rsf`).
    pub fn play_sound(&mut self, volume: u8, name: &str) -> &mut Self {
        self.opcode(Opcode::SoundPlay)
            .byte(volume.min(100))
            .string(name)
    }

    /// Stop any playing sound.
    pub fn stop_sound(&mut self) -> &mut Self {
        self.opcode(Opcode::SoundBreak)
    }

    pub fn set_led_pattern(&mut self, pattern: LedPattern) -> &mut Self {
        self.opcode(Opcode::UiWriteLed).byte(pattern as u8)
    }

    /// Reset all sensor devices to their default mode.
    pub fn clear_all_devices(&mut self) -> &mut Self {
        self.opcode(Opcode::InputDeviceClearAll).byte(LAYER)
    }

    /// Clear the change counters on one port.
    pub fn clear_changes(&mut self, port: InputPort) -> &mut Self {
        self.opcode(Opcode::InputDeviceClearChanges)
            .byte(LAYER)
            .byte(port.code())
    }

    /// Query device type (1 byte) and mode (1 byte) into global memory.
    pub fn get_type_mode(
        &mut self,
        port: InputPort,
        type_offset: usize,
        mode_offset: usize,
    ) -> &mut Self {
        self.opcode(Opcode::InputDeviceGetTypeMode)
            .byte(LAYER)
            .byte(port.code())
            .global_reply(type_offset)
            .global_reply(mode_offset)
    }

    /// Query one SI value (4-byte float) into global memory.
    pub fn ready_si(&mut self, port: InputPort, mode: u8, offset: usize) -> &mut Self {
        self.ready_value(Opcode::InputDeviceReadySi, port, mode, offset)
    }

    /// Query one raw value (4-byte integer) into global memory.
    pub fn ready_raw(&mut self, port: InputPort, mode: u8, offset: usize) -> &mut Self {
        self.ready_value(Opcode::InputDeviceReadyRaw, port, mode, offset)
    }

    /// Query one percent value (1 byte) into global memory.
    pub fn ready_percent(&mut self, port: InputPort, mode: u8, offset: usize) -> &mut Self {
        self.ready_value(Opcode::InputDeviceReadyPercent, port, mode, offset)
    }

    /// Query whether a button is pressed (1 byte, 1 = pressed).
    pub fn button_pressed(&mut self, button: BrickButton, offset: usize) -> &mut Self {
        self.opcode(Opcode::UiButtonPressed)
            .byte(button as u8)
            .global_reply(offset)
    }

    fn ready_value(&mut self, opcode: Opcode, port: InputPort, mode: u8, offset: usize) -> &mut Self {
        self.opcode(opcode)
            .byte(LAYER)
            .byte(port.code())
            .byte(0x00) // keep the attached device type
            .byte(mode)
            .byte(0x01) // one value
            .global_reply(offset)
    }
}

/// Fire-and-forget stop for `ports`.
pub fn stop_motor(ports: OutputPort, brake: bool) -> Result<Command> {
    let mut builder = CommandBuilder::direct_no_reply();
    builder.stop_motor(ports, brake);
    builder.build()
}

/// Fire-and-forget open-loop drive.
pub fn turn_motor_at_power(ports: OutputPort, power: i8) -> Result<Command> {
    let mut builder = CommandBuilder::direct_no_reply();
    builder.turn_motor_at_power(ports, power);
    builder.build()
}

/// Fire-and-forget regulated drive.
pub fn turn_motor_at_speed(ports: OutputPort, speed: i8) -> Result<Command> {
    let mut builder = CommandBuilder::direct_no_reply();
    builder.turn_motor_at_speed(ports, speed);
    builder.build()
}

pub fn play_tone(volume: u8, frequency: u16, duration_ms: u16) -> Result<Command> {
    let mut builder = CommandBuilder::direct_no_reply();
    builder.play_tone(volume, frequency, duration_ms);
    builder.build()
}

pub fn set_led_pattern(pattern: LedPattern) -> Result<Command> {
    let mut builder = CommandBuilder::direct_no_reply();
    builder.set_led_pattern(pattern);
    builder.build()
}

/// Read one SI value from `port`, answered as a 4-byte float.
pub fn read_si(port: InputPort, mode: u8) -> Result<Command> {
    let mut builder = CommandBuilder::direct_reply(4)?;
    builder.ready_si(port, mode, 0);
    builder.build()
}

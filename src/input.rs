//! Raw GPIO sampling contract plus the decoders that turn noisy line levels
//! into discrete [`InputEvent`]s: Gray-code quadrature decoding for the
//! rotary encoder and time-window debouncing for the push buttons.

use std::time::{Duration, Instant};

use crate::event::{Button, InputEvent};

/// Instantaneous levels of the encoder and button lines, already normalized
/// so `true` means "active" (encoder line high, button pressed).
#[derive(Debug, Clone, Copy)]
pub struct RawSample {
    pub clk: bool,
    pub dt: bool,
    pub back: bool,
    pub confirm: bool,
    pub at: Instant,
}

/// Source of line levels, called once per loop tick. The hardware build
/// reads GPIO; the simulator synthesizes levels from keyboard input.
pub trait InputSource {
    fn sample(&mut self) -> RawSample;
}

/// Signed step per (previous phase << 2 | current phase) transition.
/// Single-bit Gray transitions contribute ±1; same-phase and double-bit
/// entries are zero.
const QUAD_STEPS: [i8; 16] = [0, 1, -1, 0, -1, 0, 0, 1, 1, 0, 0, -1, 0, -1, 1, 0];

/// Steps per mechanical detent on the encoder.
const STEPS_PER_DETENT: i8 = 4;

/// Tracks the encoder's two-bit phase and accumulates valid steps until a
/// full detent is reached. Bounce shows up as either a repeated phase (no-op)
/// or a back-and-forth step pair that cancels in the accumulator; a double-bit
/// jump is treated as noise and the stored phase stays at the last valid one.
struct Quadrature {
    phase: u8,
    accumulator: i8,
}

impl Quadrature {
    fn new(sample: &RawSample) -> Self {
        Self {
            phase: Self::encode(sample),
            accumulator: 0,
        }
    }

    fn encode(sample: &RawSample) -> u8 {
        (u8::from(sample.clk) << 1) | u8::from(sample.dt)
    }

    fn poll(&mut self, sample: &RawSample) -> Option<InputEvent> {
        let phase = Self::encode(sample);
        if phase == self.phase {
            return None;
        }
        let step = QUAD_STEPS[usize::from(self.phase << 2 | phase)];
        if step == 0 {
            // Both lines flipped within one poll: bounce or a missed sample.
            // Resync by keeping the last valid phase so drift never reaches
            // the accumulator.
            return None;
        }
        self.phase = phase;
        self.accumulator += step;
        if self.accumulator >= STEPS_PER_DETENT {
            self.accumulator -= STEPS_PER_DETENT;
            Some(InputEvent::RotateCw)
        } else if self.accumulator <= -STEPS_PER_DETENT {
            self.accumulator += STEPS_PER_DETENT;
            Some(InputEvent::RotateCcw)
        } else {
            None
        }
    }
}

/// Per-button debounce and long-press state.
struct DebouncedButton {
    button: Button,
    debounced: bool,
    candidate: bool,
    candidate_since: Instant,
    pressed_at: Option<Instant>,
    long_fired: bool,
}

impl DebouncedButton {
    fn new(button: Button, level: bool, now: Instant) -> Self {
        Self {
            button,
            debounced: level,
            candidate: level,
            candidate_since: now,
            pressed_at: if level { Some(now) } else { None },
            long_fired: false,
        }
    }

    fn is_down(&self) -> bool {
        self.debounced
    }

    fn poll(&mut self, level: bool, now: Instant, config: &DecoderConfig, out: &mut Vec<InputEvent>) {
        if level != self.candidate {
            self.candidate = level;
            self.candidate_since = now;
        }
        if self.candidate != self.debounced
            && now.duration_since(self.candidate_since) >= config.debounce
        {
            self.debounced = self.candidate;
            if self.debounced {
                self.pressed_at = Some(now);
                self.long_fired = false;
                out.push(InputEvent::ButtonDown(self.button));
            } else {
                self.pressed_at = None;
                out.push(InputEvent::ButtonUp(self.button));
            }
        }
        if let Some(pressed_at) = self.pressed_at {
            let held = now.duration_since(pressed_at);
            if !self.long_fired && held >= config.long_press {
                self.long_fired = true;
                out.push(InputEvent::LongPress {
                    button: self.button,
                    held,
                });
            }
        }
    }
}

/// Timing knobs for the decoder, taken from [`crate::config::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    pub debounce: Duration,
    pub long_press: Duration,
    pub quit_hold: Duration,
}

/// Converts a stream of [`RawSample`]s into zero or more [`InputEvent`]s per
/// sample. Never errors; malformed samples are absorbed by the resync rules.
pub struct InputDecoder {
    quadrature: Quadrature,
    back: DebouncedButton,
    confirm: DebouncedButton,
    both_down_since: Option<Instant>,
    quit_fired: bool,
    config: DecoderConfig,
}

impl InputDecoder {
    /// The first sample seeds the phase and button levels without emitting
    /// events, so a device that boots with a button held stays quiet.
    pub fn new(first: &RawSample, config: DecoderConfig) -> Self {
        Self {
            quadrature: Quadrature::new(first),
            back: DebouncedButton::new(Button::Back, first.back, first.at),
            confirm: DebouncedButton::new(Button::Confirm, first.confirm, first.at),
            both_down_since: None,
            quit_fired: false,
            config,
        }
    }

    pub fn poll(&mut self, sample: &RawSample) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if let Some(rotate) = self.quadrature.poll(sample) {
            events.push(rotate);
        }
        self.back
            .poll(sample.back, sample.at, &self.config, &mut events);
        self.confirm
            .poll(sample.confirm, sample.at, &self.config, &mut events);

        if self.back.is_down() && self.confirm.is_down() {
            let since = *self.both_down_since.get_or_insert(sample.at);
            if !self.quit_fired && sample.at.duration_since(since) >= self.config.quit_hold {
                self.quit_fired = true;
                events.push(InputEvent::QuitRequested);
            }
        } else {
            self.both_down_since = None;
            self.quit_fired = false;
        }
        events
    }
}

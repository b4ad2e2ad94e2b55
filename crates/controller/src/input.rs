//! Input sources: an edge-triggered keyboard adapter and a scripted queue.

use std::collections::VecDeque;

use pikavolley_sim::{FrameInputs, InputSnapshot, InputSource, Side};

/// Raw held-key state of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub power_hit: bool,
}

/// Turns held keys into per-frame snapshots.
///
/// Left wins over right and up wins over down. `power_hit` is reported only on
/// the first captured frame the key is held.
#[derive(Debug, Clone, Default)]
pub struct Keyboard {
    held: [KeyState; 2],
    power_hit_was_down: [bool; 2],
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_keys(&mut self, side: Side, keys: KeyState) {
        self.held[side.index()] = keys;
    }

    fn snapshot(&mut self, index: usize) -> InputSnapshot {
        let keys = self.held[index];
        let x_direction = if keys.left {
            -1
        } else if keys.right {
            1
        } else {
            0
        };
        let y_direction = if keys.up {
            -1
        } else if keys.down {
            1
        } else {
            0
        };
        let power_hit = keys.power_hit && !self.power_hit_was_down[index];
        self.power_hit_was_down[index] = keys.power_hit;
        InputSnapshot::new(x_direction, y_direction, power_hit)
    }
}

impl InputSource for Keyboard {
    fn capture(&mut self) -> FrameInputs {
        [self.snapshot(0), self.snapshot(1)]
    }
}

/// Queue of prepared frames. Idle once empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<FrameInputs>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, inputs: FrameInputs) {
        self.frames.push_back(inputs);
    }

    pub fn push_idle(&mut self, frames: usize) {
        self.frames
            .extend(std::iter::repeat_n([InputSnapshot::IDLE; 2], frames));
    }

    /// Queue a single frame where only `side` presses the action key.
    pub fn push_power_hit(&mut self, side: Side) {
        let mut inputs = [InputSnapshot::IDLE; 2];
        inputs[side.index()].power_hit = true;
        self.push(inputs);
    }

    pub fn pending(&self) -> usize {
        self.frames.len()
    }
}

impl Extend<FrameInputs> for ScriptedInput {
    fn extend<T: IntoIterator<Item = FrameInputs>>(&mut self, iter: T) {
        self.frames.extend(iter);
    }
}

impl InputSource for ScriptedInput {
    fn capture(&mut self) -> FrameInputs {
        self.frames
            .pop_front()
            .unwrap_or([InputSnapshot::IDLE; 2])
    }
}

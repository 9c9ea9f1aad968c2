//! Keyboard-driven input state.
//!
//! The platform layer feeds key events into an [`InputController`]; once per
//! frame the controller produces an [`InputState`] that is passed explicitly to
//! [`Scene::update`](crate::scene::Scene::update).

use std::collections::HashSet;

use crate::{Axis, Direction};

/// Keys the viewer reacts to. Platform code maps its own key codes onto these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    X,
    Y,
    Z,
    Left,
    Right,
    Up,
    Down,
    W,
    S,
    NumpadAdd,
    NumpadSubtract,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Rotate(Axis),
    Translate(Axis, Direction),
    ScaleUp,
    ScaleDown,
    Quit,
}

/// Fixed key table.
pub const KEY_BINDINGS: &[(Key, Action)] = &[
    (Key::X, Action::Rotate(Axis::X)),
    (Key::Y, Action::Rotate(Axis::Y)),
    (Key::Z, Action::Rotate(Axis::Z)),
    (Key::Right, Action::Translate(Axis::X, Direction::Positive)),
    (Key::Left, Action::Translate(Axis::X, Direction::Negative)),
    (Key::Up, Action::Translate(Axis::Y, Direction::Positive)),
    (Key::Down, Action::Translate(Axis::Y, Direction::Negative)),
    (Key::W, Action::Translate(Axis::Z, Direction::Positive)),
    (Key::S, Action::Translate(Axis::Z, Direction::Negative)),
    (Key::NumpadAdd, Action::ScaleUp),
    (Key::NumpadSubtract, Action::ScaleDown),
    (Key::Escape, Action::Quit),
];

pub fn action_for(key: Key) -> Option<Action> {
    KEY_BINDINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, action)| *action)
}

/// Input snapshot for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputState {
    /// Axis currently being rotated about, if any.
    pub rotation: Option<Axis>,
    /// Per-axis translation flag + direction, indexed by [`Axis::index`].
    pub translation: [Option<Direction>; 3],
    /// Uniform scale applied to every object.
    pub scale: f32,
}

impl InputState {
    /// Fresh frame: no translation, persistent rotation axis and scale carried in.
    pub fn new(rotation: Option<Axis>, scale: f32) -> Self {
        Self {
            rotation,
            translation: [None; 3],
            scale,
        }
    }

    #[inline]
    pub fn translation_along(&self, axis: Axis) -> Option<Direction> {
        self.translation[axis.index()]
    }

    pub fn is_translating(&self) -> bool {
        self.translation.iter().any(Option::is_some)
    }
}

/// Accumulates key events between frames.
#[derive(Debug)]
pub struct InputController {
    rotation: Option<Axis>,
    scale: f32,
    scale_factor: f32,
    held: HashSet<Key>,
}

impl InputController {
    pub fn new(scale_factor: f32) -> Self {
        Self {
            rotation: None,
            scale: 1.0,
            scale_factor,
            held: HashSet::new(),
        }
    }

    #[inline]
    pub fn active_rotation(&self) -> Option<Axis> {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Feed one key event. Returns the bound action on a fresh press.
    ///
    /// Rotation and scale only react to fresh presses; translation follows the
    /// held-key set and is resolved in [`frame_state`](Self::frame_state).
    pub fn key_event(&mut self, key: Key, pressed: bool, repeat: bool) -> Option<Action> {
        let action = action_for(key)?;

        if !pressed {
            self.held.remove(&key);
            return None;
        }
        self.held.insert(key);
        if repeat {
            return None;
        }

        match action {
            Action::Rotate(axis) => self.rotation = Some(axis),
            Action::ScaleUp => self.scale += self.scale * self.scale_factor,
            Action::ScaleDown => self.scale -= self.scale * self.scale_factor,
            Action::Translate(..) | Action::Quit => {}
        }
        Some(action)
    }

    /// Drop all held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Build this frame's input. Translation starts cleared and is set only for
    /// keys held right now; opposite keys on one axis cancel.
    pub fn frame_state(&self) -> InputState {
        let mut state = InputState::new(self.rotation, self.scale);
        let mut sums = [0i32; 3];

        for key in &self.held {
            if let Some(Action::Translate(axis, dir)) = action_for(*key) {
                sums[axis.index()] += dir.sign() as i32;
            }
        }

        for (slot, sum) in state.translation.iter_mut().zip(sums) {
            *slot = match sum.signum() {
                1 => Some(Direction::Positive),
                -1 => Some(Direction::Negative),
                _ => None,
            };
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(ctl: &mut InputController, key: Key) -> Option<Action> {
        ctl.key_event(key, true, false)
    }

    #[test]
    fn every_key_has_exactly_one_binding() {
        let keys = [
            Key::X,
            Key::Y,
            Key::Z,
            Key::Left,
            Key::Right,
            Key::Up,
            Key::Down,
            Key::W,
            Key::S,
            Key::NumpadAdd,
            Key::NumpadSubtract,
            Key::Escape,
        ];
        for key in keys {
            let n = KEY_BINDINGS.iter().filter(|(k, _)| *k == key).count();
            assert_eq!(n, 1, "{key:?}");
        }
        assert_eq!(KEY_BINDINGS.len(), keys.len());
        assert_eq!(action_for(Key::Escape), Some(Action::Quit));
    }

    #[test]
    fn new_rotation_axis_replaces_previous() {
        let mut ctl = InputController::new(0.05);
        press(&mut ctl, Key::X);
        assert_eq!(ctl.frame_state().rotation, Some(Axis::X));

        press(&mut ctl, Key::Y);
        assert_eq!(ctl.active_rotation(), Some(Axis::Y));
        assert_eq!(ctl.frame_state().rotation, Some(Axis::Y));
    }

    #[test]
    fn fresh_frame_has_no_translation() {
        let state = InputState::new(Some(Axis::Z), 2.0);
        assert!(!state.is_translating());

        let ctl = InputController::new(0.05);
        assert!(!ctl.frame_state().is_translating());
    }

    #[test]
    fn translation_follows_held_keys() {
        let mut ctl = InputController::new(0.05);
        press(&mut ctl, Key::Right);
        press(&mut ctl, Key::S);
        let frame = ctl.frame_state();
        assert_eq!(frame.translation_along(Axis::X), Some(Direction::Positive));
        assert_eq!(frame.translation_along(Axis::Z), Some(Direction::Negative));
        assert_eq!(frame.translation_along(Axis::Y), None);

        // Still held on the next frame.
        assert_eq!(ctl.frame_state(), frame);

        ctl.key_event(Key::Right, false, false);
        ctl.key_event(Key::S, false, false);
        assert!(!ctl.frame_state().is_translating());
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut ctl = InputController::new(0.05);
        press(&mut ctl, Key::Up);
        press(&mut ctl, Key::Down);
        assert_eq!(ctl.frame_state().translation_along(Axis::Y), None);
    }

    #[test]
    fn scale_changes_per_press_not_per_repeat() {
        let mut ctl = InputController::new(0.05);
        press(&mut ctl, Key::NumpadAdd);
        assert!((ctl.scale() - 1.05).abs() < 1e-6);

        assert_eq!(ctl.key_event(Key::NumpadAdd, true, true), None);
        assert!((ctl.scale() - 1.05).abs() < 1e-6);

        press(&mut ctl, Key::NumpadSubtract);
        assert!((ctl.scale() - 1.05 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn release_all_stops_translation() {
        let mut ctl = InputController::new(0.05);
        press(&mut ctl, Key::W);
        ctl.release_all();
        assert!(!ctl.frame_state().is_translating());
    }
}

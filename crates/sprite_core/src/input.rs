//! Input state tracking for the two event kinds the host delivers.
//!
//! - **Keys** are tracked both level-triggered (`is_held`) and edge-triggered
//!   (`is_just_pressed` / `is_just_released`). Edges are cleared by
//!   `end_frame()`, which the shell calls after the frame has consumed them.
//!
//! - **Pointer presses** are queued in arrival order, in host pixel
//!   coordinates. The shell drains them once per frame, maps each one into the
//!   internal resolution space, and forwards it to the scene.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Back,
    Space,
    Enter,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    pointer_downs: Vec<Vec2>,
    pub pointer_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            pointer_downs: Vec::new(),
            pointer_position: Vec2::ZERO,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Record a pointer press at `position` (host pixels).
    pub fn pointer_down(&mut self, position: Vec2) {
        self.pointer_position = position;
        self.pointer_downs.push(position);
    }

    /// Take every queued pointer press, oldest first.
    pub fn drain_pointer_downs(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.pointer_downs)
    }

    pub fn pending_pointer_downs(&self) -> usize {
        self.pointer_downs.len()
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn just_pressed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.just_pressed.iter().copied()
    }

    pub fn just_released_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.just_released.iter().copied()
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::Space);
        assert!(input.is_held(Key::Space));
        assert!(input.is_just_pressed(Key::Space));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Space);
        input.key_up(Key::Space);
        assert!(!input.is_held(Key::Space));
        assert!(input.is_just_released(Key::Space));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Back);
        assert!(!input.is_just_released(Key::Back));
        assert!(!input.is_held(Key::Back));
    }

    #[test]
    fn test_end_frame_clears_edges_but_keeps_held() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_down(Key::Escape);
        input.key_up(Key::Escape);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Left));
        assert!(!input.is_just_released(Key::Escape));
        assert!(input.is_held(Key::Left));
    }

    #[test]
    fn test_pointer_downs_drain_in_arrival_order() {
        let mut input = InputState::new();
        input.pointer_down(Vec2::new(10.0, 20.0));
        input.pointer_down(Vec2::new(30.0, 40.0));
        input.pointer_down(Vec2::new(50.0, 60.0));
        assert_eq!(input.pending_pointer_downs(), 3);
        assert_eq!(input.pointer_position, Vec2::new(50.0, 60.0));

        let drained = input.drain_pointer_downs();
        assert_eq!(
            drained,
            vec![
                Vec2::new(10.0, 20.0),
                Vec2::new(30.0, 40.0),
                Vec2::new(50.0, 60.0)
            ]
        );
        assert_eq!(input.pending_pointer_downs(), 0);
        assert!(input.drain_pointer_downs().is_empty());
    }

    #[test]
    fn test_just_pressed_keys_lists_edges() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        input.key_down(Key::Down);
        let mut keys: Vec<Key> = input.just_pressed_keys().collect();
        keys.sort_by_key(|k| format!("{k:?}"));
        assert_eq!(keys, vec![Key::Down, Key::Up]);
    }
}

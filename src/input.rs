use std::collections::HashSet;

/// Logical keys and buttons. The comment on each variant is its default
/// physical binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// left arrow
    Left,
    /// right arrow
    Right,
    /// up arrow
    Up,
    /// down arrow
    Down,
    /// space
    Brake,
    /// enter
    Confirm,
    /// escape
    Cancel,
    /// delete
    Delete,
    /// P
    Pause,
    /// E
    Edit,
    /// L
    LoadSaved,
    /// M
    Grid,
    /// 1
    ResetVehicle,
    /// N
    NewObstacle,
    /// C
    NewCargo,
    /// V
    ToggleShape,
    /// comma
    RotateCcw,
    /// period
    RotateCw,
    /// S
    Save,
    /// A
    PanLeft,
    /// D
    PanRight,
    /// R
    DensityDown,
    /// T
    DensityUp,
    /// F
    FrictionDown,
    /// G
    FrictionUp,
    /// left mouse button
    Primary,
}

/// Input sampled for a single tick. The pointer is in screen pixels with
/// the origin at the bottom-left corner.
#[derive(Clone, Debug, Default)]
pub struct Input {
    pressed: HashSet<Key>,
    held: HashSet<Key>,
    released: HashSet<Key>,
    pub pointer: nalgebra::Vector2<f32>,
}

impl Input {
    /// True only on the tick the key went down.
    pub fn just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// True only on the tick the key went up.
    pub fn just_released(&self, key: Key) -> bool {
        self.released.contains(&key)
    }

    /// True for every tick the key is down, including the first.
    pub fn held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Records a key going down this tick.
    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn hold(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.released.insert(key);
        }
    }

    /// Clears edge-triggered state between ticks, keeping held keys.
    pub fn end_tick(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_last_one_tick() {
        let mut input = Input::default();
        input.press(Key::Primary);
        assert!(input.just_pressed(Key::Primary));
        assert!(input.held(Key::Primary));

        input.end_tick();
        assert!(!input.just_pressed(Key::Primary));
        assert!(input.held(Key::Primary));

        input.release(Key::Primary);
        assert!(input.just_released(Key::Primary));
        assert!(!input.held(Key::Primary));
        input.end_tick();
        assert!(!input.just_released(Key::Primary));
    }

    #[test]
    fn repeated_press_while_held_is_not_an_edge() {
        let mut input = Input::default();
        input.hold(Key::Right);
        input.press(Key::Right);
        assert!(!input.just_pressed(Key::Right));
    }
}

use super::Game;
use crate::{
    input::{Input, Key},
    render::Renderer,
};
use nalgebra::Vector2;
use rapier2d::dynamics::RigidBodyHandle;

/// Force per unit of mass and per world unit of drag distance.
const DRAG_STRENGTH: f32 = 100.0;

/// A drag gesture in progress: the grabbed body and the grab point in its
/// local frame.
#[derive(Clone, Copy, Debug)]
pub(super) struct ForceDrag {
    body: RigidBodyHandle,
    local: Vector2<f32>,
}

impl Game {
    /// Primary press grabs the vehicle or an obstacle under the pointer;
    /// release flings it toward the pointer with a one-step force.
    pub(super) fn update_drag(&mut self, input: &Input) {
        let point = self.pointer_world();
        if input.just_pressed(Key::Primary) {
            self.drag = self.grab(point);
        } else if input.just_released(Key::Primary) {
            if let Some(drag) = self.drag.take() {
                self.fling(drag, point);
            }
        }
    }

    pub(super) fn render_drag(&self, renderer: &mut dyn Renderer) {
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        if let Some(body) = self.scene.as_ref().and_then(|scene| scene.find(drag.body)) {
            let anchor = self.engine.world_point(body, drag.local);
            renderer.line(self.camera.world_to_screen(anchor), self.pointer);
        }
    }

    fn grab(&self, point: Vector2<f32>) -> Option<ForceDrag> {
        let scene = self.scene.as_ref()?;
        let body = scene
            .vehicle
            .bodies()
            .chain(scene.bodies.iter())
            .find(|body| self.engine.contains_point(body, point))?;
        log::debug!("Dragging {:?}", body.handle());
        Some(ForceDrag {
            body: body.handle(),
            local: self.engine.local_point(body, point),
        })
    }

    fn fling(&mut self, drag: ForceDrag, point: Vector2<f32>) {
        let Some(body) = self.scene.as_ref().and_then(|scene| scene.find(drag.body)) else {
            return;
        };
        let anchor = self.engine.world_point(body, drag.local);
        let force = (point - anchor) * DRAG_STRENGTH * self.engine.mass(body);
        let dt = self.engine.time_step();
        self.engine.apply_impulse_at_point(body, force * dt, anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{tests::*, GameState};
    use super::*;

    #[test]
    fn release_flings_toward_the_pointer() {
        let (mut game, _) = playing_game(1);
        let chassis = game.engine().position(&game.scene().unwrap().vehicle.chassis);
        click_at(&mut game, chassis);
        assert!(game.drag.is_some());

        let mut input = Input::default();
        input.hold(Key::Primary);
        input.release(Key::Primary);
        input.pointer = game.camera().world_to_screen(chassis + Vector2::new(0.0, 1.0));
        game.tick(&input);

        assert!(game.drag.is_none());
        let velocity = game
            .engine()
            .linear_velocity(&game.scene().unwrap().vehicle.chassis);
        assert!(velocity.y > 1.0, "{:?}", velocity);
    }

    #[test]
    fn pausing_drops_the_drag() {
        let (mut game, _) = playing_game(1);
        let chassis = game.engine().position(&game.scene().unwrap().vehicle.chassis);
        click_at(&mut game, chassis);
        assert!(game.drag.is_some());

        press(&mut game, Key::Pause);
        assert!(game.drag.is_none());
        press(&mut game, Key::Pause);
        assert_eq!(game.state(), Some(&GameState::Play));
        assert!(game.drag.is_none());
    }

    #[test]
    fn press_on_empty_space_grabs_nothing() {
        let (mut game, _) = playing_game(1);
        click_at(&mut game, Vector2::new(30.0, 6.0));
        assert!(game.drag.is_none());
    }

    #[test]
    fn cargo_cannot_be_dragged() {
        let (mut game, _) = playing_game(1);
        let cargo = game.engine().position(&game.scene().unwrap().cargo[0]);
        click_at(&mut game, cargo);
        assert!(game.drag.is_none());
    }
}

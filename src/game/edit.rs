use super::{Game, GameState, StateStack};
use crate::{
    body::{BodyDesc, BodyKind, GameBody, Shape, ShapeKind},
    engine::Engine,
    input::{Input, Key},
    level,
    render::{Overlay, Renderer, Role},
};
use nalgebra::Vector2;
use rapier2d::dynamics::RigidBodyHandle;
use std::f32::consts::PI;

const RESIZE_STEP: f32 = 0.1;
/// Anything thinner than this counts as collapsed.
const MIN_EXTENT: f32 = 1e-3;
const MATERIAL_STEP: f32 = 0.1;
const ROTATE_STEP: f32 = PI / 160.0;
const NUDGE_STEP: f32 = 0.01;
const PAN_STEP: f32 = 0.1;

const EDIT_HELP: [&str; 8] = [
    "Exit with E, save with S",
    "N new obstacle, C new cargo",
    "Click to place or select",
    "Arrows resize or move",
    "Comma and period rotate",
    "V toggles the shape",
    "R/T density, F/G friction",
    "A/D pan, Delete removes",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    Main,
    /// A pending body follows the cursor until it is placed or dropped.
    Placement,
    Selected(RigidBodyHandle),
}

/// How the edit stack changes after an update.
enum EditStep {
    Push(EditState),
    Replace(EditState),
    Pop,
}

#[derive(Default)]
pub(super) struct Editor {
    pub(super) states: StateStack<EditState>,
    pub(super) pending: Option<GameBody>,
    place_shape: ShapeKind,
}

/// A fresh sensor body for placement. Cargo is dynamic, obstacles static.
fn pending_desc(kind: ShapeKind, cargo: bool, position: Vector2<f32>) -> BodyDesc {
    let desc = match (kind, cargo) {
        (ShapeKind::Rectangle, true) => BodyDesc::rectangle(position, 0.2, 0.2),
        (ShapeKind::Rectangle, false) => BodyDesc::rectangle(position, 1.0, 0.2),
        (ShapeKind::Circle, _) => BodyDesc::circle(position, 0.2),
    };
    let desc = if cargo {
        desc.material(1.0, 1.0).kind(BodyKind::Dynamic)
    } else {
        desc.material(1.0, 0.8).kind(BodyKind::Static)
    };
    desc.sensor(true)
}

/// The shape after one resize press, or `None` when the key does not apply
/// or the result would collapse.
fn resized(shape: Shape, key: Key) -> Option<Shape> {
    let step = |value: f32, delta: f32| Some(value + delta).filter(|v| *v > MIN_EXTENT);
    match shape {
        Shape::Rectangle {
            half_width,
            half_height,
        } => {
            let (dw, dh) = match key {
                Key::Left => (-RESIZE_STEP, 0.0),
                Key::Right => (RESIZE_STEP, 0.0),
                Key::Down => (0.0, -RESIZE_STEP),
                Key::Up => (0.0, RESIZE_STEP),
                _ => return None,
            };
            Some(Shape::Rectangle {
                half_width: step(half_width, dw)?,
                half_height: step(half_height, dh)?,
            })
        }
        Shape::Circle { radius } => {
            let delta = match key {
                Key::Left | Key::Down => -RESIZE_STEP,
                Key::Right | Key::Up => RESIZE_STEP,
                _ => return None,
            };
            Some(Shape::Circle {
                radius: step(radius, delta)?,
            })
        }
    }
}

/// Applies a material step, rejecting results below zero.
fn stepped(value: f32, input: &Input, down: Key, up: Key) -> Option<f32> {
    let delta = if input.just_pressed(down) {
        -MATERIAL_STEP
    } else if input.just_pressed(up) {
        MATERIAL_STEP
    } else {
        return None;
    };
    let next = value + delta;
    // tolerate rounding when stepping down to exactly zero
    (next > -MATERIAL_STEP * 0.5).then(|| next.max(0.0))
}

fn rotation(input: &Input) -> f32 {
    let mut spin = 0.0;
    if input.held(Key::RotateCcw) {
        spin += ROTATE_STEP;
    }
    if input.held(Key::RotateCw) {
        spin -= ROTATE_STEP;
    }
    spin
}

fn body_info(engine: &Engine, body: &GameBody) -> Vec<String> {
    let position = engine.position(body);
    let (half_width, half_height) = body.shape.half_extents().unwrap_or_default();
    vec![
        format!("Position: ({:.2}, {:.2})", position.x, position.y),
        format!("Angle: {:.2}", engine.angle(body)),
        format!("Width: {:.2}", half_width),
        format!("Height: {:.2}", half_height),
        format!("Radius: {:.2}", body.shape.radius().unwrap_or_default()),
        format!("Density: {:.2}", engine.density(body)),
        format!("Friction: {:.2}", engine.friction(body)),
    ]
}

impl Game {
    pub(super) fn enter_editor(&mut self) {
        self.drag = None;
        self.hud.title = "Edit mode".to_string();
        self.hud.help = EDIT_HELP.iter().map(|s| s.to_string()).collect();
        self.hud.info.clear();
        self.editor.states.clear();
        self.editor.states.push(EditState::Main);
    }

    pub(super) fn update_editor(&mut self, input: &Input) -> Option<GameState> {
        if input.just_pressed(Key::Edit) {
            self.leave_editor();
            return Some(GameState::Play);
        }

        let point = self.pointer_world();
        if let Some(body) = self.editor.pending.as_ref() {
            let angle = self.engine.angle(body);
            self.engine.set_transform(body, point, angle);
        }

        let step = match self.editor.states.top().copied() {
            Some(EditState::Main) => self.edit_main(input, point),
            Some(EditState::Placement) => self.edit_placement(input, point),
            Some(EditState::Selected(handle)) => self.edit_selected(input, point, handle),
            None => Some(EditStep::Push(EditState::Main)),
        };
        match step {
            Some(EditStep::Push(state)) => self.editor.states.push(state),
            Some(EditStep::Replace(state)) => {
                self.editor.states.pop();
                self.editor.states.push(state);
            }
            Some(EditStep::Pop) => {
                self.editor.states.pop();
            }
            None => {}
        }

        if input.held(Key::PanLeft) {
            self.camera.x -= PAN_STEP;
        }
        if input.held(Key::PanRight) {
            self.camera.x += PAN_STEP;
        }
        if input.just_pressed(Key::Save) {
            self.save_level();
        }
        self.hud.info = self.info_target().map_or(Vec::new(), |body| body_info(&self.engine, body));
        None
    }

    pub(super) fn render_editor(&self, renderer: &mut dyn Renderer) {
        renderer.text(Overlay::Title, &[self.hud.title.clone()]);
        renderer.text(Overlay::Help, &self.hud.help);
        if !self.hud.info.is_empty() {
            renderer.text(Overlay::Info, &self.hud.info);
        }
        if let Some(body) = self.editor.pending.as_ref() {
            renderer.body(&self.sprite(body, Role::Pending));
        }
    }

    fn leave_editor(&mut self) {
        self.editor.states.clear();
        if let Some(body) = self.editor.pending.take() {
            self.engine.destroy_body(body);
        }
        if let Some(scene) = self.scene.as_mut() {
            for body in scene.bodies.iter_mut().chain(scene.cargo.iter_mut()) {
                body.selected = false;
            }
        }
        self.hud.info.clear();
    }

    /// The pending body, or else the selected one.
    fn info_target(&self) -> Option<&GameBody> {
        if let Some(body) = self.editor.pending.as_ref() {
            return Some(body);
        }
        match self.editor.states.top() {
            Some(&EditState::Selected(handle)) => self.scene.as_ref()?.find(handle),
            _ => None,
        }
    }

    /// Clears every selection flag, then selects the first obstacle or
    /// cargo body containing `point`.
    fn select_at(&mut self, point: Vector2<f32>) -> Option<RigidBodyHandle> {
        let scene = self.scene.as_mut()?;
        let mut hit = None;
        for body in scene.bodies.iter_mut().chain(scene.cargo.iter_mut()) {
            body.selected = hit.is_none() && self.engine.contains_point(body, point);
            if body.selected {
                hit = Some(body.handle());
            }
        }
        hit
    }

    fn edit_main(&mut self, input: &Input, point: Vector2<f32>) -> Option<EditStep> {
        if input.just_pressed(Key::Primary) {
            return self
                .select_at(point)
                .map(|handle| EditStep::Push(EditState::Selected(handle)));
        }
        let (kind, cargo) = if input.just_pressed(Key::NewObstacle) {
            (self.editor.place_shape, false)
        } else if input.just_pressed(Key::NewCargo) {
            (ShapeKind::Rectangle, true)
        } else {
            return None;
        };
        let mut body = self.engine.create_body(&pending_desc(kind, cargo, point));
        body.cargo = cargo;
        log::debug!("Placing a new {:?} {}", kind, if cargo { "cargo" } else { "obstacle" });
        self.editor.pending = Some(body);
        Some(EditStep::Push(EditState::Placement))
    }

    fn edit_placement(&mut self, input: &Input, point: Vector2<f32>) -> Option<EditStep> {
        if input.just_pressed(Key::Cancel) {
            if let Some(body) = self.editor.pending.take() {
                self.engine.destroy_body(body);
            }
            return Some(EditStep::Pop);
        }
        if input.just_pressed(Key::Primary) {
            self.place_pending();
            return Some(EditStep::Pop);
        }
        if input.just_pressed(Key::ToggleShape) {
            self.toggle_pending_shape(point);
        }

        let body = match self.editor.pending.as_mut() {
            Some(body) => body,
            None => return Some(EditStep::Pop),
        };
        for key in [Key::Left, Key::Right, Key::Up, Key::Down] {
            if !input.just_pressed(key) {
                continue;
            }
            if let Some(shape) = resized(body.shape, key) {
                body.shape = shape;
                self.engine.rebuild_shape(body);
            }
        }
        let spin = rotation(input);
        if spin != 0.0 {
            let angle = self.engine.angle(body) + spin;
            self.engine.set_transform(body, point, angle);
        }
        if let Some(density) = stepped(body.density, input, Key::DensityDown, Key::DensityUp) {
            self.engine.set_density(body, density);
        }
        if let Some(friction) = stepped(body.friction, input, Key::FrictionDown, Key::FrictionUp) {
            self.engine.set_friction(body, friction);
        }
        None
    }

    fn place_pending(&mut self) {
        let Some(body) = self.editor.pending.take() else {
            return;
        };
        let Some(scene) = self.scene.as_mut() else {
            self.engine.destroy_body(body);
            return;
        };
        self.engine.set_sensor(&body, false);
        log::info!(
            "Placed {:?} at {:?}",
            body.shape,
            self.engine.position(&body)
        );
        if body.cargo {
            scene.cargo.push(body);
        } else {
            scene.bodies.push(body);
        }
    }

    fn toggle_pending_shape(&mut self, point: Vector2<f32>) {
        let Some(old) = self.editor.pending.take() else {
            return;
        };
        let kind = match old.shape.kind() {
            ShapeKind::Rectangle => ShapeKind::Circle,
            ShapeKind::Circle => ShapeKind::Rectangle,
        };
        let angle = self.engine.angle(&old);
        let body_kind = self.engine.kind(&old);
        let cargo = old.cargo;
        self.engine.destroy_body(old);

        let mut body = self
            .engine
            .create_body(&pending_desc(kind, cargo, point).kind(body_kind));
        body.cargo = cargo;
        self.engine.set_transform(&body, point, angle);
        if !cargo {
            self.editor.place_shape = kind;
        }
        self.editor.pending = Some(body);
    }

    fn edit_selected(
        &mut self,
        input: &Input,
        point: Vector2<f32>,
        handle: RigidBodyHandle,
    ) -> Option<EditStep> {
        if input.just_pressed(Key::Primary) {
            return Some(match self.select_at(point) {
                Some(hit) => EditStep::Replace(EditState::Selected(hit)),
                None => EditStep::Pop,
            });
        }
        let scene = match self.scene.as_mut() {
            Some(scene) => scene,
            None => return Some(EditStep::Pop),
        };
        if input.just_pressed(Key::Delete) {
            if let Some(body) = scene.remove_prop(handle) {
                log::info!("Deleting {:?}", body.shape);
                self.engine.destroy_body(body);
            }
            return Some(EditStep::Pop);
        }

        let body = match scene.find_prop_mut(handle) {
            Some(body) => body,
            None => return Some(EditStep::Pop),
        };
        let mut offset = Vector2::zeros();
        if input.held(Key::Left) {
            offset.x -= NUDGE_STEP;
        }
        if input.held(Key::Right) {
            offset.x += NUDGE_STEP;
        }
        if input.held(Key::Down) {
            offset.y -= NUDGE_STEP;
        }
        if input.held(Key::Up) {
            offset.y += NUDGE_STEP;
        }
        let spin = rotation(input);
        if offset != Vector2::zeros() || spin != 0.0 {
            let position = self.engine.position(body) + offset;
            let angle = self.engine.angle(body) + spin;
            self.engine.set_transform(body, position, angle);
        }
        None
    }

    fn save_level(&mut self) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        let name = self
            .level_info
            .as_ref()
            .map_or("New level", |info| info.name.as_str());
        let data = level::snapshot(&self.engine, name, &scene.bodies, &scene.cargo);
        match self.store.save(&self.config.save_file, &data) {
            Ok(()) => log::info!(
                "Saved {} bodies and {} cargo to {}",
                data.bodies.len(),
                data.cargo.len(),
                self.config.save_file
            ),
            Err(e) => {
                log::error!("Unable to save the level: {}", e);
                panic!("Unable to save the level: {}", e);
            }
        }
    }
}

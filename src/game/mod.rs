mod drag;
mod edit;
mod stack;
mod states;

pub use self::edit::EditState;
pub use self::stack::StateStack;
pub use self::states::GameState;

use crate::{
    body::{BodyDesc, GameBody},
    config::{self, LevelInfo},
    engine::Engine,
    input::Input,
    level::{self, LevelData, LevelStore},
    render::{BodySprite, Camera, Overlay, Renderer, Role},
    vehicle::Vehicle,
};
use rapier2d::dynamics::RigidBodyHandle;

/// Everything a loaded level puts into the world.
pub struct Scene {
    pub ground: GameBody,
    pub goal: GameBody,
    pub vehicle: Vehicle,
    pub bodies: Vec<GameBody>,
    pub cargo: Vec<GameBody>,
}

impl Scene {
    fn build(engine: &mut Engine, config: &config::Game, level: &LevelData) -> Self {
        let block = |b: &config::Block| {
            BodyDesc::rectangle(b.pos.into(), b.half[0], b.half[1]).material(b.density, b.friction)
        };
        let ground = engine.create_body(&block(&config.arena.ground));
        let goal = engine.create_body(&block(&config.arena.goal).sensor(true));
        let vehicle = Vehicle::new(engine, &config.vehicle);
        let bodies = level::spawn_bodies(engine, &level.bodies, false);
        let cargo = level::spawn_bodies(engine, &level.cargo, true);
        Self {
            ground,
            goal,
            vehicle,
            bodies,
            cargo,
        }
    }

    fn destroy(self, engine: &mut Engine) {
        self.vehicle.destroy(engine);
        for body in self.bodies.into_iter().chain(self.cargo) {
            engine.destroy_body(body);
        }
        engine.destroy_body(self.goal);
        engine.destroy_body(self.ground);
    }

    /// Destroys obstacles and cargo, then builds them again from `level`.
    fn respawn_props(&mut self, engine: &mut Engine, level: &LevelData) {
        for body in self.bodies.drain(..).chain(self.cargo.drain(..)) {
            engine.destroy_body(body);
        }
        self.bodies = level::spawn_bodies(engine, &level.bodies, false);
        self.cargo = level::spawn_bodies(engine, &level.cargo, true);
    }

    /// Obstacles first, then cargo, in insertion order.
    pub fn props(&self) -> impl Iterator<Item = &GameBody> {
        self.bodies.iter().chain(self.cargo.iter())
    }

    fn find(&self, handle: RigidBodyHandle) -> Option<&GameBody> {
        self.vehicle
            .bodies()
            .chain(self.props())
            .find(|body| body.handle() == handle)
    }

    /// Takes an obstacle or cargo body out of its collection.
    fn remove_prop(&mut self, handle: RigidBodyHandle) -> Option<GameBody> {
        if let Some(index) = self.bodies.iter().position(|b| b.handle() == handle) {
            return Some(self.bodies.remove(index));
        }
        let index = self.cargo.iter().position(|b| b.handle() == handle)?;
        Some(self.cargo.remove(index))
    }

    fn find_prop_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut GameBody> {
        self.bodies
            .iter_mut()
            .chain(self.cargo.iter_mut())
            .find(|body| body.handle() == handle)
    }
}

#[derive(Default)]
struct Hud {
    title: String,
    help: Vec<String>,
    info: Vec<String>,
    banner: Vec<String>,
    banner_alpha: f32,
    finished: Vec<String>,
}

pub struct Game {
    config: config::Game,
    store: Box<dyn LevelStore>,
    engine: Engine,
    camera: Camera,
    pointer: nalgebra::Vector2<f32>,
    scene: Option<Scene>,
    level: LevelData,
    level_info: Option<LevelInfo>,
    level_index: usize,
    score: u32,
    show_grid: bool,
    drag: Option<drag::ForceDrag>,
    editor: edit::Editor,
    hud: Hud,
    states: StateStack<GameState>,
}

impl Game {
    /// Starts loading the first configured level right away.
    pub fn new(config: config::Game, store: Box<dyn LevelStore>) -> Self {
        log::info!("Initializing with {} levels", config.levels.len());
        let first = match config.levels.first() {
            Some(info) => info.clone(),
            None => panic!("The config lists no levels"),
        };
        let mut game = Self {
            engine: Engine::new(&config.physics),
            config,
            store,
            camera: Camera::default(),
            pointer: nalgebra::Vector2::zeros(),
            scene: None,
            level: LevelData::default(),
            level_info: None,
            level_index: 0,
            score: 0,
            show_grid: false,
            drag: None,
            editor: edit::Editor::default(),
            hud: Hud::default(),
            states: StateStack::default(),
        };
        game.push_state(GameState::Loading(first));
        game
    }

    pub fn state(&self) -> Option<&GameState> {
        self.states.top()
    }

    pub fn edit_state(&self) -> Option<&EditState> {
        self.editor.states.top()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level_count(&self) -> usize {
        self.config.levels.len()
    }

    pub fn level_info(&self) -> Option<&LevelInfo> {
        self.level_info.as_ref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn pending(&self) -> Option<&GameBody> {
        self.editor.pending.as_ref()
    }

    /// The last level is finished and there is nothing left to load.
    pub fn is_complete(&self) -> bool {
        self.states.top() == Some(&GameState::Finished)
            && self.level_index >= self.config.levels.len()
    }

    /// Runs the top state for one tick. A state asking for a transition is
    /// replaced, and its successor's entry action runs within the same tick.
    #[profiling::function]
    pub fn tick(&mut self, input: &Input) {
        self.pointer = input.pointer;
        if let Some(next) = self.update_state(input) {
            self.replace_state(next);
        }
    }

    fn push_state(&mut self, state: GameState) {
        log::debug!("Entering {:?}", state);
        self.states.push(state.clone());
        self.enter_state(&state);
    }

    fn replace_state(&mut self, state: GameState) {
        self.states.pop();
        self.push_state(state);
    }

    fn pointer_world(&self) -> nalgebra::Vector2<f32> {
        self.camera.screen_to_world(self.pointer)
    }

    fn sprite(&self, body: &GameBody, role: Role) -> BodySprite {
        BodySprite {
            role,
            shape: body.shape,
            position: self.camera.world_to_screen(self.engine.position(body)),
            angle: self.engine.angle(body),
            selected: body.selected,
        }
    }

    /// Draws the world, then lets the top state draw its overlays.
    #[profiling::function]
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if self.show_grid {
            renderer.grid();
        }
        if let Some(scene) = self.scene.as_ref() {
            renderer.body(&self.sprite(&scene.goal, Role::Goal));
            for body in scene.bodies.iter() {
                renderer.body(&self.sprite(body, Role::Obstacle));
            }
            for body in scene.cargo.iter() {
                renderer.body(&self.sprite(body, Role::Cargo));
            }
            for body in scene.vehicle.bodies() {
                renderer.body(&self.sprite(body, Role::Vehicle));
            }
            renderer.body(&self.sprite(&scene.ground, Role::Ground));
        }
        renderer.text(Overlay::Score, &[format!("Score: {}", self.score)]);
        self.render_state(renderer);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        body::{BodyKind, ShapeKind},
        input::Key,
        level::{BodyRecord, MemoryStore},
    };
    use nalgebra::Vector2;

    pub fn rect(x: f32, y: f32, hw: f32, hh: f32, kind: BodyKind) -> BodyRecord {
        BodyRecord {
            x,
            y,
            half_width: hw,
            half_height: hh,
            density: 1.0,
            friction: 0.8,
            body_type: kind,
            shape_kind: ShapeKind::Rectangle,
            ..Default::default()
        }
    }

    pub fn ball(x: f32, y: f32, r: f32, kind: BodyKind) -> BodyRecord {
        BodyRecord {
            x,
            y,
            radius: r,
            density: 1.0,
            friction: 0.8,
            body_type: kind,
            shape_kind: ShapeKind::Circle,
            ..Default::default()
        }
    }

    /// Two overlapping static obstacles, one cargo box short of the goal
    /// and one already past it.
    pub fn level_one() -> LevelData {
        LevelData {
            name: "One".to_string(),
            bodies: vec![
                rect(10.0, 1.5, 1.0, 0.2, BodyKind::Static),
                ball(10.5, 1.5, 0.5, BodyKind::Static),
            ],
            cargo: vec![
                rect(6.0, 1.2, 0.2, 0.2, BodyKind::Dynamic),
                rect(55.0, 1.2, 0.2, 0.2, BodyKind::Dynamic),
            ],
        }
    }

    pub fn level_two() -> LevelData {
        LevelData {
            name: "Two".to_string(),
            bodies: vec![rect(20.0, 1.0, 0.5, 0.5, BodyKind::Static)],
            cargo: vec![],
        }
    }

    pub fn new_game(levels: usize) -> (Game, MemoryStore) {
        let store = MemoryStore::default();
        store.insert("one.ron", level_one());
        store.insert("two.ron", level_two());
        let infos = [("One", "one.ron"), ("Two", "two.ron")]
            .iter()
            .take(levels)
            .map(|&(name, filename)| LevelInfo {
                name: name.to_string(),
                filename: filename.to_string(),
            })
            .collect();
        let game = Game::new(config::Game::with_levels(infos), Box::new(store.clone()));
        (game, store)
    }

    pub fn idle(game: &mut Game) {
        game.tick(&Input::default());
    }

    pub fn press(game: &mut Game, key: Key) {
        let mut input = Input::default();
        input.press(key);
        game.tick(&input);
    }

    pub fn click_at(game: &mut Game, world: Vector2<f32>) {
        let mut input = Input::default();
        input.pointer = game.camera.world_to_screen(world);
        input.press(Key::Primary);
        game.tick(&input);
    }

    pub fn playing_game(levels: usize) -> (Game, MemoryStore) {
        let (mut game, store) = new_game(levels);
        while game.state() != Some(&GameState::Play) {
            idle(&mut game);
        }
        (game, store)
    }

    /// Ground, goal and the vehicle's three bodies.
    pub const FIXED_BODIES: usize = 5;

    #[test]
    fn new_game_loads_the_first_level() {
        let (game, _) = new_game(2);
        assert!(matches!(game.state(), Some(GameState::Loading(_))));
        assert_eq!(game.level_info().unwrap().name, "One");
        let scene = game.scene().unwrap();
        assert_eq!(scene.bodies.len(), 2);
        assert_eq!(scene.cargo.len(), 2);
        assert!(scene.cargo.iter().all(|body| body.cargo));
        assert_eq!(game.engine().body_count(), FIXED_BODIES + 4);
        assert_eq!(game.engine().joint_count(), 2);
        assert!(game.engine().is_sensor(&scene.goal));
    }

    #[test]
    #[should_panic]
    fn missing_level_file_aborts() {
        let store = MemoryStore::default();
        let info = LevelInfo {
            name: "Ghost".to_string(),
            filename: "ghost.ron".to_string(),
        };
        Game::new(config::Game::with_levels(vec![info]), Box::new(store));
    }

    #[test]
    fn render_draws_world_then_top_state() {
        #[derive(Default)]
        struct Recorder {
            bodies: Vec<Role>,
            texts: Vec<(Overlay, Vec<String>)>,
        }
        impl Renderer for Recorder {
            fn body(&mut self, sprite: &BodySprite) {
                self.bodies.push(sprite.role);
            }
            fn text(&mut self, overlay: Overlay, lines: &[String]) {
                self.texts.push((overlay, lines.to_vec()));
            }
            fn line(&mut self, _from: Vector2<f32>, _to: Vector2<f32>) {}
            fn grid(&mut self) {}
        }

        let (mut game, _) = playing_game(1);
        press(&mut game, Key::Pause);
        let mut recorder = Recorder::default();
        game.render(&mut recorder);

        assert_eq!(recorder.bodies.len(), FIXED_BODIES + 4);
        assert_eq!(recorder.bodies.first(), Some(&Role::Goal));
        assert_eq!(recorder.bodies.last(), Some(&Role::Ground));
        let titles: Vec<_> = recorder
            .texts
            .iter()
            .filter(|(overlay, _)| *overlay == Overlay::Title)
            .collect();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].1, vec!["Paused".to_string()]);
        assert!(recorder
            .texts
            .iter()
            .all(|(overlay, _)| !matches!(overlay, Overlay::Banner { .. })));
    }
}

use super::{Game, Scene};
use crate::{
    config::LevelInfo,
    input::{Input, Key},
    level,
    render::{Overlay, Renderer},
    vehicle::MotorMode,
};

/// Seconds the intro banner stays up before play starts.
const INTRO_DURATION: f32 = 4.0;
/// Seconds after which the intro banner starts fading.
const INTRO_FADE: f32 = 2.0;
/// Extra clearance behind the chassis before the goal counts as reached.
const GOAL_MARGIN: f32 = 0.3;

const DRIVE_HELP: [&str; 3] = [
    "Accelerate with <- and -> keys",
    "Brake with space",
    "Restart with Enter",
];
const INTRO_LINE: &str = "Carry the payload to the finish line";

#[derive(Clone, Debug, PartialEq)]
pub enum GameState {
    Loading(LevelInfo),
    /// `elapsed` is simulated time in seconds.
    GameStart { elapsed: f32 },
    Play,
    Paused,
    Edit,
    Finished,
    Restart,
}

fn lines(text: &[&str]) -> Vec<String> {
    text.iter().map(|s| s.to_string()).collect()
}

impl Game {
    pub(super) fn enter_state(&mut self, state: &GameState) {
        match state {
            GameState::Loading(info) => self.enter_loading(info),
            GameState::GameStart { .. } => {
                let name = self
                    .level_info
                    .as_ref()
                    .map_or(String::new(), |info| info.name.clone());
                self.hud.title = "Normal mode".to_string();
                self.hud.help = lines(&DRIVE_HELP);
                self.hud.banner = vec![name, INTRO_LINE.to_string()];
                self.hud.banner_alpha = 1.0;
            }
            GameState::Play => {
                self.hud.title = "Normal mode".to_string();
                self.hud.help = lines(&DRIVE_HELP);
            }
            GameState::Paused => {
                self.drag = None;
                self.hud.title = "Paused".to_string();
                self.hud.help = lines(&DRIVE_HELP[..2]);
            }
            GameState::Edit => self.enter_editor(),
            GameState::Finished => self.enter_finished(),
            GameState::Restart => self.enter_restart(),
        }
    }

    /// The transition table: returns the state that replaces the top one.
    pub(super) fn update_state(&mut self, input: &Input) -> Option<GameState> {
        let state = self.states.top().cloned()?;
        match state {
            GameState::Loading(_) => Some(GameState::GameStart { elapsed: 0.0 }),
            GameState::GameStart { elapsed } => self.update_intro(elapsed, input),
            GameState::Play => self.update_play(input),
            GameState::Paused => input
                .just_pressed(Key::Pause)
                .then_some(GameState::Play),
            GameState::Edit => self.update_editor(input),
            GameState::Finished => {
                let next = self.config.levels.get(self.level_index);
                match next {
                    Some(info) if input.just_pressed(Key::Confirm) => {
                        Some(GameState::Loading(info.clone()))
                    }
                    _ => None,
                }
            }
            GameState::Restart => Some(GameState::Play),
        }
    }

    pub(super) fn render_state(&self, renderer: &mut dyn Renderer) {
        let Some(state) = self.states.top() else {
            return;
        };
        match state {
            GameState::Loading(_) | GameState::Restart => {}
            GameState::GameStart { .. } => {
                renderer.text(Overlay::Title, &[self.hud.title.clone()]);
                renderer.text(Overlay::Help, &self.hud.help);
                renderer.text(
                    Overlay::Banner {
                        alpha: self.hud.banner_alpha,
                    },
                    &self.hud.banner,
                );
            }
            GameState::Play => {
                renderer.text(Overlay::Title, &[self.hud.title.clone()]);
                renderer.text(Overlay::Help, &self.hud.help);
                self.render_drag(renderer);
            }
            GameState::Paused => {
                renderer.text(Overlay::Title, &[self.hud.title.clone()]);
                renderer.text(Overlay::Help, &self.hud.help);
            }
            GameState::Edit => self.render_editor(renderer),
            GameState::Finished => {
                renderer.text(Overlay::Title, &[self.hud.title.clone()]);
                renderer.text(Overlay::Finished, &self.hud.finished);
            }
        }
    }

    fn enter_loading(&mut self, info: &LevelInfo) {
        let data = match self.store.load(&info.filename) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Unable to load level '{}': {}", info.name, e);
                panic!("Unable to load level '{}': {}", info.name, e);
            }
        };
        log::info!(
            "Loading level '{}' with {} bodies and {} cargo",
            info.name,
            data.bodies.len(),
            data.cargo.len()
        );
        self.drag = None;
        if let Some(scene) = self.scene.take() {
            scene.destroy(&mut self.engine);
        }
        self.scene = Some(Scene::build(&mut self.engine, &self.config, &data));
        self.level = data;
        self.level_info = Some(info.clone());
    }

    fn enter_finished(&mut self) {
        self.level_index += 1;
        let earned = match self.scene.as_ref() {
            Some(scene) => level::score(&self.engine, &scene.goal, &scene.cargo),
            None => 0,
        };
        self.score += earned;
        log::info!("Level finished, earned {} for a total of {}", earned, self.score);

        self.hud.title = "Normal mode".to_string();
        self.hud.finished = vec![
            "Congrats you reached the goal".to_string(),
            format!("Score: {}", self.score),
        ];
        self.hud.finished.push(if self.level_index < self.config.levels.len() {
            "Continue with Enter".to_string()
        } else {
            "You have beaten the game".to_string()
        });
    }

    fn enter_restart(&mut self) {
        log::info!("Restarting the level");
        self.drag = None;
        if let Some(scene) = self.scene.as_mut() {
            scene.respawn_props(&mut self.engine, &self.level);
            scene.vehicle.reset(&mut self.engine);
        }
    }

    fn update_intro(&mut self, elapsed: f32, input: &Input) -> Option<GameState> {
        let elapsed = elapsed + self.engine.time_step();
        if let Some(GameState::GameStart { elapsed: stored }) = self.states.top_mut() {
            *stored = elapsed;
        }
        if elapsed > INTRO_DURATION {
            return Some(GameState::Play);
        }
        if elapsed > INTRO_FADE {
            self.hud.banner_alpha = (INTRO_DURATION - elapsed) / (INTRO_DURATION - INTRO_FADE);
        }
        self.simulate(input);
        self.driving_keys(input)
    }

    fn update_play(&mut self, input: &Input) -> Option<GameState> {
        if self.goal_reached() {
            return Some(GameState::Finished);
        }
        self.simulate(input);
        let next = self.driving_keys(input);
        if next.is_none() {
            self.update_drag(input);
        }
        next
    }

    fn goal_reached(&self) -> bool {
        let Some(scene) = self.scene.as_ref() else {
            return false;
        };
        let chassis = self.engine.position(&scene.vehicle.chassis);
        let goal = self.engine.position(&scene.goal);
        chassis.x - scene.vehicle.half_width() - GOAL_MARGIN > goal.x
    }

    /// One physics step, then camera follow and vehicle control.
    fn simulate(&mut self, input: &Input) {
        self.engine.step();
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        self.camera
            .follow(self.engine.position(&scene.vehicle.chassis));
        scene
            .vehicle
            .apply(&mut self.engine, MotorMode::select(input));
        if input.just_pressed(Key::ResetVehicle) {
            scene.vehicle.reset(&mut self.engine);
        }
    }

    fn driving_keys(&mut self, input: &Input) -> Option<GameState> {
        if input.just_pressed(Key::Grid) {
            self.show_grid = !self.show_grid;
        }
        if input.just_pressed(Key::Pause) {
            Some(GameState::Paused)
        } else if input.just_pressed(Key::Edit) {
            Some(GameState::Edit)
        } else if input.just_pressed(Key::Confirm) {
            Some(GameState::Restart)
        } else if input.just_pressed(Key::LoadSaved) {
            Some(GameState::Loading(LevelInfo {
                name: "New level".to_string(),
                filename: self.config.save_file.clone(),
            }))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::*;
    use crate::{body::BodyKind, level::LevelData};
    use nalgebra::Vector2;

    #[test]
    fn loading_hands_over_to_game_start_next_tick() {
        let (mut game, _) = new_game(1);
        idle(&mut game);
        assert_eq!(game.state(), Some(&GameState::GameStart { elapsed: 0.0 }));
    }

    #[test]
    fn intro_fades_then_plays() {
        let (mut game, _) = new_game(1);
        idle(&mut game);
        let dt = game.engine().time_step();
        let mut ticks = 0;
        while game.state() != Some(&GameState::Play) {
            idle(&mut game);
            ticks += 1;
            if ticks as f32 * dt > INTRO_FADE + 0.1 && ticks as f32 * dt < INTRO_DURATION {
                assert!(game.hud.banner_alpha < 1.0);
                assert!(game.hud.banner_alpha > 0.0);
            }
            assert!(ticks < 1000);
        }
        let expected = (INTRO_DURATION / dt).ceil() as i32;
        assert!((ticks - expected).abs() <= 1, "{} vs {}", ticks, expected);
    }

    #[test]
    fn intro_accepts_pause() {
        let (mut game, _) = new_game(1);
        idle(&mut game);
        press(&mut game, Key::Pause);
        assert_eq!(game.state(), Some(&GameState::Paused));
        press(&mut game, Key::Pause);
        assert_eq!(game.state(), Some(&GameState::Play));
    }

    #[test]
    fn pause_freezes_the_world() {
        let (mut game, _) = playing_game(1);
        press(&mut game, Key::Pause);
        assert_eq!(game.state(), Some(&GameState::Paused));
        let scene = game.scene().unwrap();
        let before = game.engine().position(&scene.cargo[0]);
        for _ in 0..30 {
            idle(&mut game);
        }
        let scene = game.scene().unwrap();
        assert_eq!(game.engine().position(&scene.cargo[0]), before);
        assert_eq!(game.state(), Some(&GameState::Paused));
        press(&mut game, Key::Pause);
        assert_eq!(game.state(), Some(&GameState::Play));
    }

    /// Swaps in an empty saved level and waits for play, so the vehicle has
    /// open ground ahead and behind.
    fn open_ground() -> Game {
        let (mut game, store) = playing_game(1);
        store.insert("new_level.ron", LevelData::default());
        press(&mut game, Key::LoadSaved);
        while game.state() != Some(&GameState::Play) {
            idle(&mut game);
        }
        game
    }

    fn drive(game: &mut Game, key: Key, ticks: usize) -> Vector2<f32> {
        let mut input = Input::default();
        input.hold(key);
        for _ in 0..ticks {
            game.tick(&input);
        }
        game.engine().position(&game.scene().unwrap().vehicle.chassis)
    }

    #[test]
    fn forward_drives_the_vehicle_right() {
        let mut game = open_ground();
        let start = game.engine().position(&game.scene().unwrap().vehicle.chassis);
        let end = drive(&mut game, Key::Right, 120);
        assert!(end.x > start.x + 0.5, "{:?} -> {:?}", start, end);
        assert!((end.y - start.y).abs() < 0.2, "{:?} -> {:?}", start, end);
    }

    #[test]
    fn backward_drives_the_vehicle_left() {
        let mut game = open_ground();
        let start = game.engine().position(&game.scene().unwrap().vehicle.chassis);
        let end = drive(&mut game, Key::Left, 120);
        assert!(end.x < start.x - 0.5, "{:?} -> {:?}", start, end);
        assert!((end.y - start.y).abs() < 0.2, "{:?} -> {:?}", start, end);
    }

    #[test]
    fn vehicle_rests_on_its_wheels() {
        let game = open_ground();
        let scene = game.scene().unwrap();
        let chassis = game.engine().position(&scene.vehicle.chassis);
        // wheels sit on the ground top at 0.8, so the chassis stays near 1.3
        assert!((chassis.y - 1.3).abs() < 0.15, "{:?}", chassis);
        for wheel in scene.vehicle.bodies().skip(1) {
            assert!(game.engine().position(wheel).y < chassis.y);
        }
    }

    #[test]
    fn play_steps_and_follows_the_vehicle() {
        let (mut game, _) = playing_game(1);
        let mut input = Input::default();
        input.hold(Key::Right);
        for _ in 0..30 {
            game.tick(&input);
        }
        let scene = game.scene().unwrap();
        assert_eq!(scene.vehicle.mode(), MotorMode::Forward);
        let chassis = game.engine().position(&scene.vehicle.chassis);
        assert_eq!(game.camera().x, chassis.x - crate::render::HALF_VIEW);
    }

    #[test]
    fn releasing_keys_stops_the_vehicle() {
        let (mut game, _) = playing_game(1);
        let mut input = Input::default();
        input.hold(Key::Brake);
        game.tick(&input);
        assert_eq!(game.scene().unwrap().vehicle.mode(), MotorMode::Brake);

        idle(&mut game);
        let scene = game.scene().unwrap();
        assert_eq!(scene.vehicle.mode(), MotorMode::Stop);
        for joint in scene.vehicle.wheel_joints() {
            assert_eq!(game.engine().wheel_motor(joint), None);
        }
        for wheel in scene.vehicle.bodies().skip(1) {
            assert_eq!(game.engine().angular_damping(wheel), 1.0);
        }
    }

    #[test]
    fn grid_toggles() {
        let (mut game, _) = playing_game(1);
        press(&mut game, Key::Grid);
        assert!(game.show_grid);
        press(&mut game, Key::Grid);
        assert!(!game.show_grid);
    }

    fn drive_past_goal(game: &mut Game) {
        let scene = game.scene.as_ref().unwrap();
        let goal_x = game.engine.position(&scene.goal).x;
        let chassis = &scene.vehicle.chassis;
        let y = game.engine.position(chassis).y;
        game.engine
            .set_transform(chassis, Vector2::new(goal_x + 5.0, y), 0.0);
    }

    #[test]
    fn reaching_the_goal_scores_and_advances() {
        let (mut game, _) = playing_game(2);
        drive_past_goal(&mut game);
        idle(&mut game);
        assert_eq!(game.state(), Some(&GameState::Finished));
        assert_eq!(game.level_index(), 1);
        // one 0.2 x 0.2 cargo box is past the goal
        assert_eq!(game.score(), 160);
        assert_eq!(game.hud.finished[2], "Continue with Enter");

        idle(&mut game);
        assert_eq!(game.state(), Some(&GameState::Finished));
        assert_eq!(game.level_index(), 1);

        press(&mut game, Key::Confirm);
        assert!(matches!(game.state(), Some(GameState::Loading(info)) if info.name == "Two"));
        assert_eq!(game.scene().unwrap().bodies.len(), 1);
        assert!(game.scene().unwrap().cargo.is_empty());
        assert_eq!(game.engine().body_count(), FIXED_BODIES + 1);
        assert_eq!(game.engine().joint_count(), 2);
        idle(&mut game);
        assert!(matches!(game.state(), Some(GameState::GameStart { .. })));
    }

    #[test]
    fn confirm_after_the_last_level_does_nothing() {
        let (mut game, _) = playing_game(1);
        drive_past_goal(&mut game);
        idle(&mut game);
        assert_eq!(game.state(), Some(&GameState::Finished));
        assert!(game.is_complete());
        assert_eq!(game.hud.finished[2], "You have beaten the game");
        press(&mut game, Key::Confirm);
        assert_eq!(game.state(), Some(&GameState::Finished));
        assert_eq!(game.level_index(), 1);
        assert_eq!(game.score(), 160);
    }

    #[test]
    fn restart_rebuilds_props_and_parks_the_vehicle() {
        let (mut game, _) = playing_game(1);
        {
            let scene = game.scene.as_ref().unwrap();
            game.engine
                .set_transform(&scene.bodies[0], Vector2::new(30.0, 5.0), 1.0);
            game.engine
                .set_transform(&scene.vehicle.chassis, Vector2::new(20.0, 3.0), 0.5);
        }
        press(&mut game, Key::Confirm);
        assert_eq!(game.state(), Some(&GameState::Restart));
        let scene = game.scene().unwrap();
        assert_eq!(game.engine().position(&scene.bodies[0]), Vector2::new(10.0, 1.5));
        assert_eq!(game.engine().angle(&scene.bodies[0]), 0.0);
        assert_eq!(
            game.engine().position(&scene.vehicle.chassis),
            Vector2::new(3.5, 1.3)
        );
        assert_eq!(game.engine().body_count(), FIXED_BODIES + 4);

        idle(&mut game);
        assert_eq!(game.state(), Some(&GameState::Play));
    }

    #[test]
    fn load_key_opens_the_saved_level() {
        let (mut game, store) = playing_game(1);
        store.insert(
            "new_level.ron",
            LevelData {
                name: "Saved".to_string(),
                bodies: vec![],
                cargo: vec![rect(8.0, 1.2, 0.3, 0.3, BodyKind::Dynamic)],
            },
        );
        press(&mut game, Key::LoadSaved);
        assert!(
            matches!(game.state(), Some(GameState::Loading(info)) if info.filename == "new_level.ron")
        );
        let scene = game.scene().unwrap();
        assert!(scene.bodies.is_empty());
        assert_eq!(scene.cargo.len(), 1);
        assert_eq!(game.engine().body_count(), FIXED_BODIES + 1);
        assert_eq!(game.level_index(), 0);
    }
}

use cargoboard::{
    game::{Game, GameState},
    input::{Input, Key},
    level::DirStore,
    render::{self, EguiRenderer},
};

/// Five minutes of simulated time at the default step.
const TICK_LIMIT: usize = 60 * 60 * 5;

/// Drives the game without a window: full throttle, and Enter whenever a
/// level is finished.
struct Autopilot {
    game: Game,
    input: Input,
    egui_context: egui::Context,
}

impl Autopilot {
    fn new() -> Self {
        log::info!("Initializing");

        let store = DirStore::new("data");
        let config = match store.load_config("config.ron") {
            Ok(config) => config,
            Err(e) => {
                log::error!("Unable to load the config: {}", e);
                panic!("Unable to load the config: {}", e);
            }
        };

        Self {
            game: Game::new(config, Box::new(store)),
            input: Input::default(),
            egui_context: egui::Context::default(),
        }
    }

    fn update(&mut self) {
        self.input.end_tick();
        self.input.hold(Key::Right);
        let finished = self.game.state() == Some(&GameState::Finished);
        if finished && !self.input.held(Key::Confirm) {
            self.input.press(Key::Confirm);
        } else {
            self.input.release(Key::Confirm);
        }
        self.game.tick(&self.input);
    }

    /// Paints the current frame and returns the number of tessellated
    /// primitives.
    fn redraw(&mut self) -> usize {
        let raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(render::SCREEN_WIDTH, render::SCREEN_HEIGHT),
            )),
            ..Default::default()
        };
        let game = &self.game;
        let egui_output = self.egui_context.run(raw_input, |egui_ctx| {
            let painter = egui_ctx.layer_painter(egui::LayerId::background());
            game.render(&mut EguiRenderer::new(painter));
        });
        self.egui_context.tessellate(egui_output.shapes).len()
    }
}

fn main() {
    env_logger::init();

    let mut pilot = Autopilot::new();
    let mut ticks = 0;
    while ticks < TICK_LIMIT && !pilot.game.is_complete() {
        pilot.update();
        let primitives = pilot.redraw();
        profiling::finish_frame!();
        if ticks % 600 == 0 {
            log::debug!("Tick {}: {} primitives", ticks, primitives);
        }
        ticks += 1;
    }

    let levels = pilot.game.level_index().min(pilot.game.level_count());
    log::info!(
        "Finished {} of {} levels in {} ticks, score {}",
        levels,
        pilot.game.level_count(),
        ticks,
        pilot.game.score()
    );
}

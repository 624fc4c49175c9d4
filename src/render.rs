use crate::body::Shape;
use nalgebra::Vector2;

pub const SCREEN_WIDTH: f32 = 1200.0;
pub const SCREEN_HEIGHT: f32 = 900.0;
/// Pixels per world unit.
pub const SCALE: f32 = SCREEN_WIDTH / 10.0;
/// Half the screen width, in world units.
pub const HALF_VIEW: f32 = SCREEN_WIDTH * 0.5 / SCALE;

/// Horizontal view offset in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    pub x: f32,
}

impl Camera {
    pub fn follow(&mut self, target: Vector2<f32>) {
        self.x = target.x - HALF_VIEW;
    }

    pub fn world_to_screen(&self, pos: Vector2<f32>) -> Vector2<f32> {
        Vector2::new((pos.x - self.x) * SCALE, pos.y * SCALE)
    }

    pub fn screen_to_world(&self, pos: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(pos.x / SCALE + self.x, pos.y / SCALE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Ground,
    Goal,
    Vehicle,
    Obstacle,
    Cargo,
    Pending,
}

/// One body as the renderer sees it, already in screen space.
#[derive(Clone, Copy, Debug)]
pub struct BodySprite {
    pub role: Role,
    pub shape: Shape,
    pub position: Vector2<f32>,
    pub angle: f32,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    Title,
    Help,
    Info,
    Score,
    Banner { alpha: f32 },
    Finished,
}

pub trait Renderer {
    fn body(&mut self, sprite: &BodySprite);
    fn text(&mut self, overlay: Overlay, lines: &[String]);
    fn line(&mut self, from: Vector2<f32>, to: Vector2<f32>);
    fn grid(&mut self);
}

/// Paints into an egui layer. Screen space is flipped vertically since egui
/// puts the origin at the top-left.
pub struct EguiRenderer {
    painter: egui::Painter,
}

impl EguiRenderer {
    pub fn new(painter: egui::Painter) -> Self {
        Self { painter }
    }

    fn pos(v: Vector2<f32>) -> egui::Pos2 {
        egui::pos2(v.x, SCREEN_HEIGHT - v.y)
    }

    fn color(role: Role) -> egui::Color32 {
        match role {
            Role::Ground => egui::Color32::from_rgb(0x55, 0x8b, 0x2f),
            Role::Goal => egui::Color32::from_rgb(0xd0, 0x30, 0x30),
            Role::Vehicle => egui::Color32::from_rgb(0x30, 0x30, 0x30),
            Role::Obstacle => egui::Color32::from_rgb(0x8a, 0x2b, 0xe2),
            Role::Cargo => egui::Color32::from_rgb(0xa5, 0x2a, 0x2a),
            Role::Pending => egui::Color32::from_rgb(0x70, 0x70, 0xff),
        }
    }
}

impl Renderer for EguiRenderer {
    fn body(&mut self, sprite: &BodySprite) {
        let stroke = egui::Stroke::new(3.0, Self::color(sprite.role));
        let rotation = nalgebra::Rotation2::new(sprite.angle);
        match sprite.shape {
            Shape::Rectangle {
                half_width,
                half_height,
            } => {
                let corners = |grow: f32| -> Vec<egui::Pos2> {
                    let (hw, hh) = (half_width * SCALE + grow, half_height * SCALE + grow);
                    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
                        .iter()
                        .map(|&(x, y)| Self::pos(sprite.position + rotation * Vector2::new(x, y)))
                        .collect()
                };
                self.painter.add(egui::Shape::closed_line(corners(0.0), stroke));
                if sprite.selected {
                    let highlight = egui::Stroke::new(3.0, egui::Color32::from_rgb(0xff, 0x8c, 0x00));
                    self.painter
                        .add(egui::Shape::closed_line(corners(3.0), highlight));
                }
            }
            Shape::Circle { radius } => {
                let center = Self::pos(sprite.position);
                self.painter.circle_stroke(center, radius * SCALE, stroke);
                let spoke = sprite.position + rotation * Vector2::new(0.0, radius * SCALE);
                self.painter.line_segment([center, Self::pos(spoke)], stroke);
                if sprite.selected {
                    let highlight = egui::Stroke::new(3.0, egui::Color32::from_rgb(0xff, 0x8c, 0x00));
                    self.painter
                        .circle_stroke(center, radius * SCALE + 3.0, highlight);
                }
            }
        }
    }

    fn text(&mut self, overlay: Overlay, lines: &[String]) {
        let (origin, size, alpha) = match overlay {
            Overlay::Title => (Vector2::new(100.0, 870.0), 26.0, 1.0),
            Overlay::Help => (Vector2::new(980.0, 800.0), 13.0, 1.0),
            Overlay::Info => (Vector2::new(980.0, 600.0), 13.0, 1.0),
            Overlay::Score => (Vector2::new(380.0, 860.0), 39.0, 1.0),
            Overlay::Banner { alpha } => (Vector2::new(140.0, 730.0), 39.0, alpha),
            Overlay::Finished => (Vector2::new(160.0, 780.0), 39.0, 1.0),
        };
        let color = egui::Color32::from_black_alpha((alpha.clamp(0.0, 1.0) * 255.0) as u8);
        for (i, line) in lines.iter().enumerate() {
            let pos = origin - Vector2::new(0.0, i as f32 * size * 1.2);
            self.painter.text(
                Self::pos(pos),
                egui::Align2::LEFT_TOP,
                line,
                egui::FontId::monospace(size),
                color,
            );
        }
    }

    fn line(&mut self, from: Vector2<f32>, to: Vector2<f32>) {
        let stroke = egui::Stroke::new(3.0, egui::Color32::from_rgb(0x8a, 0x2b, 0xe2));
        self.painter
            .line_segment([Self::pos(from), Self::pos(to)], stroke);
    }

    fn grid(&mut self) {
        let stroke = egui::Stroke::new(1.0, egui::Color32::GRAY);
        for i in 1..10 {
            let x = i as f32 * SCALE;
            self.painter.line_segment(
                [Self::pos(Vector2::new(x, 0.0)), Self::pos(Vector2::new(x, 7.5 * SCALE))],
                stroke,
            );
        }
        for i in 1..8 {
            let y = i as f32 * SCALE;
            self.painter.line_segment(
                [Self::pos(Vector2::new(0.0, y)), Self::pos(Vector2::new(10.0 * SCALE, y))],
                stroke,
            );
        }
    }
}

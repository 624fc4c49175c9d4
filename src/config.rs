use std::f32::consts::PI;

fn vec2(x: f32, y: f32) -> [f32; 2] {
    [x, y]
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LevelInfo {
    pub name: String,
    pub filename: String,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Physics {
    pub gravity: f32,
    pub time_step: f32,
    pub velocity_iterations: usize,
    pub stabilization_iterations: usize,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: 3.0,
            time_step: 1.0 / 60.0,
            velocity_iterations: 8,
            stabilization_iterations: 3,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Block {
    pub pos: [f32; 2],
    pub half: [f32; 2],
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
}

fn default_density() -> f32 {
    1.0
}
fn default_friction() -> f32 {
    0.8
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Wheel {
    pub pos: [f32; 2],
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Suspension {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for Suspension {
    fn default() -> Self {
        // 4 Hz with a damping ratio of 0.7
        let omega = 2.0 * PI * 4.0;
        Self {
            stiffness: omega * omega,
            damping: 2.0 * 0.7 * omega,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Vehicle {
    pub chassis: Block,
    pub wheels: [Wheel; 2],
    pub drive_speed: f32,
    pub drive_factor: f32,
    pub max_torque: f32,
    pub suspension: Suspension,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            chassis: Block {
                pos: vec2(3.5, 1.3),
                half: vec2(1.3, 0.2),
                density: 0.5,
                friction: 0.8,
            },
            wheels: [
                Wheel {
                    pos: vec2(2.6, 1.1),
                    radius: 0.3,
                    density: 1.0,
                    friction: 1.0,
                },
                Wheel {
                    pos: vec2(4.4, 1.1),
                    radius: 0.3,
                    density: 1.0,
                    friction: 1.0,
                },
            ],
            drive_speed: 20.0,
            drive_factor: 10.0,
            max_torque: 2.0,
            suspension: Suspension::default(),
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Arena {
    pub ground: Block,
    pub goal: Block,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            ground: Block {
                pos: vec2(35.0, 0.3),
                half: vec2(50.0, 0.5),
                density: 1.0,
                friction: 0.8,
            },
            goal: Block {
                pos: vec2(50.0, 2.4),
                half: vec2(0.1, 1.8),
                density: 1.0,
                friction: 0.8,
            },
        }
    }
}

fn default_save_file() -> String {
    "new_level.ron".to_string()
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Game {
    pub levels: Vec<LevelInfo>,
    #[serde(default = "default_save_file")]
    pub save_file: String,
    #[serde(default)]
    pub physics: Physics,
    #[serde(default)]
    pub vehicle: Vehicle,
    #[serde(default)]
    pub arena: Arena,
}

impl Game {
    pub fn with_levels(levels: Vec<LevelInfo>) -> Self {
        Self {
            levels,
            save_file: default_save_file(),
            physics: Physics::default(),
            vehicle: Vehicle::default(),
            arena: Arena::default(),
        }
    }
}

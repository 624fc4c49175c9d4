use crate::{
    body::{BodyDesc, BodyKind, GameBody, Shape, ShapeKind},
    engine::Engine,
};
use std::{fs, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unable to serialize the level: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BodyRecord {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub half_width: f32,
    pub half_height: f32,
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub body_type: BodyKind,
    pub shape_kind: ShapeKind,
}

impl BodyRecord {
    pub fn shape(&self) -> Shape {
        match self.shape_kind {
            ShapeKind::Rectangle => Shape::Rectangle {
                half_width: self.half_width,
                half_height: self.half_height,
            },
            ShapeKind::Circle => Shape::Circle {
                radius: self.radius,
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub name: String,
    pub bodies: Vec<BodyRecord>,
    pub cargo: Vec<BodyRecord>,
}

/// Where levels are read from and saved to.
pub trait LevelStore {
    fn load(&self, filename: &str) -> Result<LevelData, LevelError>;
    fn save(&mut self, filename: &str, level: &LevelData) -> Result<(), LevelError>;
}

/// RON files in a directory.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn load_config(&self, filename: &str) -> Result<crate::config::Game, LevelError> {
        self.read(filename)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, filename: &str) -> Result<T, LevelError> {
        let path = self.root.join(filename);
        let bytes = fs::read(&path).map_err(|source| LevelError::Io {
            path: path.clone(),
            source,
        })?;
        ron::de::from_bytes(&bytes).map_err(|source| LevelError::Parse { path, source })
    }
}

impl LevelStore for DirStore {
    fn load(&self, filename: &str) -> Result<LevelData, LevelError> {
        self.read(filename)
    }

    fn save(&mut self, filename: &str, level: &LevelData) -> Result<(), LevelError> {
        let path = self.root.join(filename);
        let text = ron::ser::to_string_pretty(level, ron::ser::PrettyConfig::default())?;
        fs::write(&path, text).map_err(|source| LevelError::Io { path, source })
    }
}

/// Shares its contents between clones so tests can look at what was saved.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    pub levels: std::rc::Rc<std::cell::RefCell<std::collections::HashMap<String, LevelData>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn insert(&self, filename: &str, level: LevelData) {
        self.levels.borrow_mut().insert(filename.to_string(), level);
    }

    pub fn get(&self, filename: &str) -> Option<LevelData> {
        self.levels.borrow().get(filename).cloned()
    }
}

#[cfg(test)]
impl LevelStore for MemoryStore {
    fn load(&self, filename: &str) -> Result<LevelData, LevelError> {
        self.get(filename).ok_or_else(|| LevelError::Io {
            path: filename.into(),
            source: std::io::ErrorKind::NotFound.into(),
        })
    }

    fn save(&mut self, filename: &str, level: &LevelData) -> Result<(), LevelError> {
        self.insert(filename, level.clone());
        Ok(())
    }
}

/// Builds one body per record, rotated to the stored angle after creation.
pub fn spawn_bodies(engine: &mut Engine, records: &[BodyRecord], cargo: bool) -> Vec<GameBody> {
    records
        .iter()
        .map(|record| {
            let position = nalgebra::Vector2::new(record.x, record.y);
            let desc = BodyDesc {
                shape: record.shape(),
                position,
                density: record.density,
                friction: record.friction,
                sensor: false,
                kind: record.body_type,
            };
            let mut body = engine.create_body(&desc);
            engine.set_transform(&body, position, record.angle);
            body.cargo = cargo;
            body
        })
        .collect()
}

/// Live transform and material come from the engine, geometry from the
/// cached shape.
pub fn record_of(engine: &Engine, body: &GameBody) -> BodyRecord {
    let position = engine.position(body);
    let (half_width, half_height) = body.shape.half_extents().unwrap_or_default();
    BodyRecord {
        x: position.x,
        y: position.y,
        angle: engine.angle(body),
        half_width,
        half_height,
        radius: body.shape.radius().unwrap_or_default(),
        density: engine.density(body),
        friction: engine.friction(body),
        body_type: engine.kind(body),
        shape_kind: body.shape.kind(),
    }
}

pub fn snapshot(engine: &Engine, name: &str, bodies: &[GameBody], cargo: &[GameBody]) -> LevelData {
    LevelData {
        name: name.to_string(),
        bodies: bodies.iter().map(|b| record_of(engine, b)).collect(),
        cargo: cargo.iter().map(|b| record_of(engine, b)).collect(),
    }
}

/// Points for every cargo body past the goal line. Only rectangles carry
/// half extents, so circular cargo scores nothing.
pub fn score(engine: &Engine, goal: &GameBody, cargo: &[GameBody]) -> u32 {
    let goal_x = engine.position(goal).x;
    cargo
        .iter()
        .filter(|body| engine.position(body).x > goal_x)
        .map(|body| {
            let (hw, hh) = body.shape.half_extents().unwrap_or_default();
            (4000.0 * hw as f64 * hh as f64).floor() as u32
        })
        .sum()
}

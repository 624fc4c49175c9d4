use rapier2d::dynamics::{RigidBodyHandle, RigidBodyType};
use rapier2d::geometry::{ColliderBuilder, ColliderHandle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rectangle { half_width: f32, half_height: f32 },
    Circle { radius: f32 },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match *self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Circle { .. } => ShapeKind::Circle,
        }
    }

    pub fn half_extents(&self) -> Option<(f32, f32)> {
        match *self {
            Self::Rectangle {
                half_width,
                half_height,
            } => Some((half_width, half_height)),
            Self::Circle { .. } => None,
        }
    }

    pub fn radius(&self) -> Option<f32> {
        match *self {
            Self::Rectangle { .. } => None,
            Self::Circle { radius } => Some(radius),
        }
    }

    pub(crate) fn collider_builder(&self) -> ColliderBuilder {
        match *self {
            Self::Rectangle {
                half_width,
                half_height,
            } => ColliderBuilder::cuboid(half_width, half_height),
            Self::Circle { radius } => ColliderBuilder::ball(radius),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BodyKind {
    #[default]
    Static,
    Dynamic,
    Kinematic,
}

impl BodyKind {
    pub(crate) fn to_rapier(self) -> RigidBodyType {
        match self {
            Self::Static => RigidBodyType::Fixed,
            Self::Dynamic => RigidBodyType::Dynamic,
            Self::Kinematic => RigidBodyType::KinematicPositionBased,
        }
    }

    pub(crate) fn from_rapier(body_type: RigidBodyType) -> Self {
        match body_type {
            RigidBodyType::Fixed => Self::Static,
            RigidBodyType::Dynamic => Self::Dynamic,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                Self::Kinematic
            }
        }
    }
}

/// Everything needed to put a new body into the world.
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: nalgebra::Vector2<f32>,
    pub density: f32,
    pub friction: f32,
    pub sensor: bool,
    pub kind: BodyKind,
}

impl BodyDesc {
    pub fn rectangle(position: nalgebra::Vector2<f32>, half_width: f32, half_height: f32) -> Self {
        Self {
            shape: Shape::Rectangle {
                half_width,
                half_height,
            },
            position,
            density: 1.0,
            friction: 0.8,
            sensor: false,
            kind: BodyKind::Static,
        }
    }

    pub fn circle(position: nalgebra::Vector2<f32>, radius: f32) -> Self {
        Self {
            shape: Shape::Circle { radius },
            ..Self::rectangle(position, 0.0, 0.0)
        }
    }

    pub fn material(mut self, density: f32, friction: f32) -> Self {
        self.density = density;
        self.friction = friction;
        self
    }

    pub fn kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }
}

/// A rigid body living in the `Engine`, plus the metadata the editor and
/// renderer need. It is not `Clone`: destroying consumes it, so each body is
/// destroyed at most once.
#[derive(Debug)]
pub struct GameBody {
    pub(crate) rigid_body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub selected: bool,
    pub cargo: bool,
}

impl GameBody {
    pub fn handle(&self) -> RigidBodyHandle {
        self.rigid_body
    }
}

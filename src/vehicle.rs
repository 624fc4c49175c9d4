use crate::{
    body::{BodyDesc, BodyKind, GameBody},
    engine::{Engine, WheelJoint, WheelJointDesc},
    input::{Input, Key},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MotorMode {
    Forward,
    Backward,
    #[default]
    Stop,
    Brake,
}

impl MotorMode {
    /// Picks the mode for this tick from the held keys.
    pub fn select(input: &Input) -> Self {
        if input.held(Key::Brake) {
            Self::Brake
        } else if input.held(Key::Right) {
            Self::Forward
        } else if input.held(Key::Left) {
            Self::Backward
        } else {
            Self::Stop
        }
    }
}

struct Wheel {
    body: GameBody,
    joint: WheelJoint,
}

pub struct Vehicle {
    pub chassis: GameBody,
    wheels: [Wheel; 2],
    mode: MotorMode,
    drive_speed: f32,
    spawn: Vec<(nalgebra::Vector2<f32>, f32)>,
}

impl Vehicle {
    pub fn new(engine: &mut Engine, config: &crate::config::Vehicle) -> Self {
        let chassis = engine.create_body(
            &BodyDesc::rectangle(
                config.chassis.pos.into(),
                config.chassis.half[0],
                config.chassis.half[1],
            )
            .material(config.chassis.density, config.chassis.friction)
            .kind(BodyKind::Dynamic),
        );
        let joint_desc = WheelJointDesc {
            stiffness: config.suspension.stiffness,
            damping: config.suspension.damping,
            drive_factor: config.drive_factor,
            max_torque: config.max_torque,
        };
        let wheels = config.wheels.each_ref().map(|wc| {
            let body = engine.create_body(
                &BodyDesc::circle(wc.pos.into(), wc.radius)
                    .material(wc.density, wc.friction)
                    .kind(BodyKind::Dynamic),
            );
            let joint = engine.create_wheel_joint(&chassis, &body, &joint_desc);
            Wheel { body, joint }
        });

        let spawn = std::iter::once(&chassis)
            .chain(wheels.iter().map(|w| &w.body))
            .map(|body| (engine.position(body), engine.angle(body)))
            .collect();
        let mut vehicle = Self {
            chassis,
            wheels,
            mode: MotorMode::Stop,
            drive_speed: config.drive_speed,
            spawn,
        };
        vehicle.apply(engine, MotorMode::Stop);
        vehicle
    }

    /// Joints go first, then wheels, then the chassis.
    pub fn destroy(self, engine: &mut Engine) {
        let mut bodies = Vec::with_capacity(3);
        for wheel in self.wheels {
            engine.destroy_joint(wheel.joint);
            bodies.push(wheel.body);
        }
        for body in bodies {
            engine.destroy_body(body);
        }
        engine.destroy_body(self.chassis);
    }

    pub fn mode(&self) -> MotorMode {
        self.mode
    }

    pub fn bodies(&self) -> impl Iterator<Item = &GameBody> {
        std::iter::once(&self.chassis).chain(self.wheels.iter().map(|w| &w.body))
    }

    pub fn wheel_joints(&self) -> impl Iterator<Item = &WheelJoint> {
        self.wheels.iter().map(|w| &w.joint)
    }

    /// Half width of the chassis, used for the goal check.
    pub fn half_width(&self) -> f32 {
        self.chassis.shape.half_extents().map_or(0.0, |(hw, _)| hw)
    }

    #[profiling::function]
    pub fn apply(&mut self, engine: &mut Engine, mode: MotorMode) {
        self.mode = mode;
        for wheel in self.wheels.iter() {
            let (enabled, speed, damping) = match mode {
                MotorMode::Forward => (true, -self.drive_speed, 0.0),
                MotorMode::Backward => (true, self.drive_speed, 0.0),
                MotorMode::Stop => (false, 0.0, 1.0),
                MotorMode::Brake => (true, -engine.joint_angular_speed(&wheel.joint), 1.0),
            };
            engine.set_angular_damping(&wheel.body, damping);
            engine.set_wheel_motor(&wheel.joint, enabled, speed);
        }
    }

    /// Puts the vehicle back where it was built, at rest.
    pub fn reset(&mut self, engine: &mut Engine) {
        for (body, &(position, angle)) in self.bodies().zip(self.spawn.iter()) {
            engine.set_transform(body, position, angle);
            engine.stop_motion(body);
        }
    }
}

use crate::body::{BodyDesc, BodyKind, GameBody};
use rapier2d::{
    dynamics::{
        CCDSolver, GenericJointBuilder, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters,
        IslandManager, JointAxesMask, JointAxis, MultibodyJointSet, RigidBody, RigidBodyBuilder,
        RigidBodySet,
    },
    geometry::{BroadPhase, Collider, ColliderSet, NarrowPhase},
    math::{Isometry, Point, Real, Vector},
    parry::query::PointQuery,
    pipeline::PhysicsPipeline,
};

#[derive(Default)]
struct Physics {
    rigid_bodies: RigidBodySet,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    solver: CCDSolver,
    colliders: ColliderSet,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    gravity: Vector<Real>,
    pipeline: PhysicsPipeline,
}

impl Physics {
    fn step(&mut self) {
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.solver,
            None, // query pipeline
            &physics_hooks,
            &event_handler,
        );
    }
}

/// Suspension and drive parameters of a wheel joint.
#[derive(Clone, Copy, Debug)]
pub struct WheelJointDesc {
    pub stiffness: f32,
    pub damping: f32,
    pub drive_factor: f32,
    pub max_torque: f32,
}

/// A wheel joint between a chassis and a wheel. Like `GameBody`, it is
/// consumed when destroyed.
#[derive(Debug)]
pub struct WheelJoint {
    handle: ImpulseJointHandle,
    chassis: rapier2d::dynamics::RigidBodyHandle,
    wheel: rapier2d::dynamics::RigidBodyHandle,
    drive_factor: f32,
    max_torque: f32,
}

/// Owner of every rigid body, collider and joint in the simulation.
pub struct Engine {
    physics: Physics,
}

impl Engine {
    pub fn new(config: &crate::config::Physics) -> Self {
        log::info!("Initializing the physics world");
        let mut physics = Physics::default();
        physics.gravity = Vector::new(0.0, -config.gravity);
        physics.integration_params.dt = config.time_step;
        physics.integration_params.max_velocity_iterations = config.velocity_iterations;
        physics.integration_params.max_stabilization_iterations = config.stabilization_iterations;
        Self { physics }
    }

    /// Advances the world by exactly one fixed timestep.
    #[profiling::function]
    pub fn step(&mut self) {
        self.physics.step();
    }

    pub fn time_step(&self) -> f32 {
        self.physics.integration_params.dt
    }

    pub fn body_count(&self) -> usize {
        self.physics.rigid_bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.physics.impulse_joints.len()
    }

    pub fn create_body(&mut self, desc: &BodyDesc) -> GameBody {
        let rigid_body = RigidBodyBuilder::new(desc.kind.to_rapier())
            .translation(desc.position)
            .build();
        let rb_handle = self.physics.rigid_bodies.insert(rigid_body);

        let collider = desc
            .shape
            .collider_builder()
            .density(desc.density)
            .friction(desc.friction)
            .sensor(desc.sensor)
            .build();
        let c_handle = self.physics.colliders.insert_with_parent(
            collider,
            rb_handle,
            &mut self.physics.rigid_bodies,
        );

        GameBody {
            rigid_body: rb_handle,
            collider: c_handle,
            shape: desc.shape,
            density: desc.density,
            friction: desc.friction,
            selected: false,
            cargo: false,
        }
    }

    pub fn destroy_body(&mut self, body: GameBody) {
        let removed = self.physics.rigid_bodies.remove(
            body.rigid_body,
            &mut self.physics.island_manager,
            &mut self.physics.colliders,
            &mut self.physics.impulse_joints,
            &mut self.physics.multibody_joints,
            true,
        );
        if removed.is_none() {
            panic!("Body {:?} is not alive", body.rigid_body);
        }
    }

    /// Replaces the collider of `body` with one built from its current
    /// shape and material. The rigid body handle is kept.
    pub fn rebuild_shape(&mut self, body: &mut GameBody) {
        let old = self
            .physics
            .colliders
            .remove(
                body.collider,
                &mut self.physics.island_manager,
                &mut self.physics.rigid_bodies,
                true,
            )
            .unwrap_or_else(|| panic!("Collider {:?} is not alive", body.collider));
        let collider = body
            .shape
            .collider_builder()
            .density(body.density)
            .friction(body.friction)
            .sensor(old.is_sensor())
            .build();
        body.collider = self.physics.colliders.insert_with_parent(
            collider,
            body.rigid_body,
            &mut self.physics.rigid_bodies,
        );
    }

    fn rigid_body(&self, body: &GameBody) -> &RigidBody {
        &self.physics.rigid_bodies[body.rigid_body]
    }

    fn rigid_body_mut(&mut self, body: &GameBody) -> &mut RigidBody {
        &mut self.physics.rigid_bodies[body.rigid_body]
    }

    fn collider(&self, body: &GameBody) -> &Collider {
        &self.physics.colliders[body.collider]
    }

    fn collider_mut(&mut self, body: &GameBody) -> &mut Collider {
        &mut self.physics.colliders[body.collider]
    }

    pub fn is_sensor(&self, body: &GameBody) -> bool {
        self.collider(body).is_sensor()
    }

    pub fn set_sensor(&mut self, body: &GameBody, sensor: bool) {
        self.collider_mut(body).set_sensor(sensor);
    }

    pub fn density(&self, body: &GameBody) -> f32 {
        self.collider(body).density()
    }

    pub fn set_density(&mut self, body: &mut GameBody, density: f32) {
        body.density = density;
        self.collider_mut(body).set_density(density);
    }

    pub fn friction(&self, body: &GameBody) -> f32 {
        self.collider(body).friction()
    }

    pub fn set_friction(&mut self, body: &mut GameBody, friction: f32) {
        body.friction = friction;
        self.collider_mut(body).set_friction(friction);
    }

    pub fn kind(&self, body: &GameBody) -> BodyKind {
        BodyKind::from_rapier(self.rigid_body(body).body_type())
    }

    pub fn position(&self, body: &GameBody) -> nalgebra::Vector2<f32> {
        *self.rigid_body(body).translation()
    }

    pub fn angle(&self, body: &GameBody) -> f32 {
        self.rigid_body(body).rotation().angle()
    }

    pub fn set_transform(&mut self, body: &GameBody, position: nalgebra::Vector2<f32>, angle: f32) {
        self.rigid_body_mut(body)
            .set_position(Isometry::new(position, angle), true);
    }

    pub fn stop_motion(&mut self, body: &GameBody) {
        let rb = self.rigid_body_mut(body);
        rb.set_linvel(Vector::zeros(), true);
        rb.set_angvel(0.0, true);
    }

    #[cfg(test)]
    pub fn linear_velocity(&self, body: &GameBody) -> nalgebra::Vector2<f32> {
        *self.rigid_body(body).linvel()
    }

    pub fn angular_damping(&self, body: &GameBody) -> f32 {
        self.rigid_body(body).angular_damping()
    }

    pub fn set_angular_damping(&mut self, body: &GameBody, damping: f32) {
        self.rigid_body_mut(body).set_angular_damping(damping);
    }

    pub fn mass(&self, body: &GameBody) -> f32 {
        self.rigid_body(body).mass()
    }

    /// Tests the point against the body's shape at the body's current
    /// transform, including transforms set since the last step.
    pub fn contains_point(&self, body: &GameBody, point: nalgebra::Vector2<f32>) -> bool {
        let position = self.rigid_body(body).position();
        self.collider(body)
            .shape()
            .contains_point(position, &Point::from(point))
    }

    pub fn local_point(&self, body: &GameBody, point: nalgebra::Vector2<f32>) -> nalgebra::Vector2<f32> {
        self.rigid_body(body)
            .position()
            .inverse_transform_point(&Point::from(point))
            .coords
    }

    pub fn world_point(&self, body: &GameBody, local: nalgebra::Vector2<f32>) -> nalgebra::Vector2<f32> {
        (self.rigid_body(body).position() * Point::from(local)).coords
    }

    pub fn apply_impulse_at_point(
        &mut self,
        body: &GameBody,
        impulse: nalgebra::Vector2<f32>,
        point: nalgebra::Vector2<f32>,
    ) {
        self.rigid_body_mut(body)
            .apply_impulse_at_point(impulse, Point::from(point), true);
    }

    /// Couples `wheel` to `chassis` at the wheel's current center: sliding
    /// is only allowed along the chassis' vertical axis, held by a spring,
    /// and the wheel spins freely until its motor is enabled. The two bodies
    /// never collide with each other.
    pub fn create_wheel_joint(
        &mut self,
        chassis: &GameBody,
        wheel: &GameBody,
        desc: &WheelJointDesc,
    ) -> WheelJoint {
        let center = Point::from(self.position(wheel));
        let anchor = self
            .rigid_body(chassis)
            .position()
            .inverse_transform_point(&center);
        let joint = GenericJointBuilder::new(JointAxesMask::X)
            .local_anchor1(anchor)
            .local_anchor2(Point::origin())
            .motor_position(JointAxis::Y, 0.0, desc.stiffness, desc.damping)
            .contacts_enabled(false)
            .build();
        let handle =
            self.physics
                .impulse_joints
                .insert(chassis.rigid_body, wheel.rigid_body, joint, true);
        WheelJoint {
            handle,
            chassis: chassis.rigid_body,
            wheel: wheel.rigid_body,
            drive_factor: desc.drive_factor,
            max_torque: desc.max_torque,
        }
    }

    pub fn destroy_joint(&mut self, joint: WheelJoint) {
        if self
            .physics
            .impulse_joints
            .remove(joint.handle, true)
            .is_none()
        {
            panic!("Joint {:?} is not alive", joint.handle);
        }
    }

    /// Spin rate of the wheel relative to the chassis.
    pub fn joint_angular_speed(&self, joint: &WheelJoint) -> f32 {
        let bodies = &self.physics.rigid_bodies;
        bodies[joint.wheel].angvel() - bodies[joint.chassis].angvel()
    }

    pub fn set_wheel_motor(&mut self, joint: &WheelJoint, enabled: bool, speed: f32) {
        let data = match self.physics.impulse_joints.get_mut(joint.handle) {
            Some(impulse_joint) => &mut impulse_joint.data,
            None => panic!("Joint {:?} is not alive", joint.handle),
        };
        if enabled {
            data.set_motor_velocity(JointAxis::AngX, speed, joint.drive_factor);
            data.set_motor_max_force(JointAxis::AngX, joint.max_torque);
        } else {
            data.motor_axes.remove(JointAxesMask::ANG_X);
        }
    }

    /// Target speed of the wheel motor, or `None` while it is disabled.
    pub fn wheel_motor(&self, joint: &WheelJoint) -> Option<f32> {
        let impulse_joint = self
            .physics
            .impulse_joints
            .get(joint.handle)
            .unwrap_or_else(|| panic!("Joint {:?} is not alive", joint.handle));
        impulse_joint
            .data
            .motor(JointAxis::AngX)
            .map(|motor| motor.target_vel)
    }
}

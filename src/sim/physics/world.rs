//! rapier2d-backed world
//!
//! Callers work in screen pixels; rapier sees meters at `PX_PER_M` so its
//! default tolerances (contact slop, sleep thresholds) stay meaningful.

use glam::Vec2;
use rapier2d::prelude::*;

use super::{BodyDesc, BodyHandle, BodyKind, BodyPose, PhysicsWorld};
use crate::error::{FxError, Result};

/// Screen pixels per simulation meter
const PX_PER_M: f32 = 100.0;
const LINEAR_DAMPING: f32 = 0.1;
const ANGULAR_DAMPING: f32 = 0.5;

#[inline]
fn to_sim(v: Vec2) -> Vector<Real> {
    vector![v.x / PX_PER_M, v.y / PX_PER_M]
}

#[inline]
fn to_screen(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x * PX_PER_M, v.y * PX_PER_M)
}

/// Collision filter for `group`: members of a non-zero group skip each other
fn interaction_groups(group: u32) -> InteractionGroups {
    if group == 0 || group >= 32 {
        return InteractionGroups::all();
    }
    let bit = Group::from_bits_truncate(1 << group);
    InteractionGroups::new(bit, Group::ALL & !bit)
}

/// One body as the caller created it
#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    handle: RigidBodyHandle,
    /// Meters
    half_extents: Vector<Real>,
    kind: BodyKind,
}

/// Kinematic grab in progress
#[derive(Debug, Clone, Copy)]
struct Drag {
    entry: usize,
    /// Body center minus grab point, meters
    offset: Vector<Real>,
    target: Vector<Real>,
    /// Last per-step velocity, handed back to the body on release
    velocity: Vector<Real>,
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    entries: Vec<BodyEntry>,
    epoch: u32,
    drag: Option<Drag>,
}

impl RapierWorld {
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    pub fn gravity(&self) -> Vec2 {
        to_screen(&self.gravity)
    }

    fn resolve(&self, handle: BodyHandle) -> Option<usize> {
        let index = handle.index as usize;
        (handle.epoch == self.epoch && index < self.entries.len()).then_some(index)
    }

    fn reset_sets(&mut self) {
        self.island_manager = IslandManager::new();
        self.broad_phase = BroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.impulse_joint_set = ImpulseJointSet::new();
        self.multibody_joint_set = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.rigid_body_set = RigidBodySet::new();
        self.collider_set = ColliderSet::new();
    }
}

impl PhysicsWorld for RapierWorld {
    fn create(gravity: Vec2) -> Result<Self> {
        if !gravity.is_finite() {
            return Err(FxError::PhysicsInit(format!("gravity {gravity} is not finite")));
        }
        log::debug!("Physics world created, gravity {gravity} px/s²");
        Ok(Self {
            gravity: to_sim(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            entries: Vec::new(),
            epoch: 0,
            drag: None,
        })
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let builder = match desc.kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linvel(to_sim(desc.velocity))
                .angvel(desc.angular_velocity)
                .linear_damping(LINEAR_DAMPING)
                .angular_damping(ANGULAR_DAMPING)
                // Thin text lines fall faster per step than they are tall
                .ccd_enabled(true),
        };
        let body = builder
            .translation(to_sim(desc.center))
            .rotation(desc.angle)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let half_extents = to_sim(desc.half_extents.max(Vec2::splat(0.5)));
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            // Mass per px² to mass per m²
            .density(desc.material.density * PX_PER_M * PX_PER_M)
            .restitution(desc.material.restitution)
            .friction(desc.material.friction)
            .collision_groups(interaction_groups(desc.group))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.entries.push(BodyEntry {
            handle,
            half_extents,
            kind: desc.kind,
        });
        BodyHandle {
            index: (self.entries.len() - 1) as u32,
            epoch: self.epoch,
        }
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if let Some(drag) = self.drag.as_mut() {
            if let Some(body) = self.entries.get(drag.entry).and_then(|e| self.rigid_body_set.get_mut(e.handle)) {
                let next = drag.target + drag.offset;
                drag.velocity = (next - body.translation()) / dt;
                body.set_next_kinematic_translation(next);
            }
        }

        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    fn query_body(&self, handle: BodyHandle) -> Option<BodyPose> {
        let entry = self.entries.get(self.resolve(handle)?)?;
        let body = self.rigid_body_set.get(entry.handle)?;
        Some(BodyPose {
            position: to_screen(body.translation()),
            angle: body.rotation().angle(),
        })
    }

    fn dynamic_count(&self) -> usize {
        // A dragged body is kinematic inside rapier but still counts
        self.entries.iter().filter(|e| e.kind == BodyKind::Dynamic).count()
    }

    fn pick(&self, point: Vec2) -> Option<BodyHandle> {
        let p = to_sim(point);
        let p = point![p.x, p.y];
        self.entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, e)| e.kind == BodyKind::Dynamic)
            .find(|(_, e)| {
                self.rigid_body_set.get(e.handle).is_some_and(|body| {
                    let local = body.position().inverse_transform_point(&p);
                    local.x.abs() <= e.half_extents.x && local.y.abs() <= e.half_extents.y
                })
            })
            .map(|(index, _)| BodyHandle {
                index: index as u32,
                epoch: self.epoch,
            })
    }

    fn begin_drag(&mut self, handle: BodyHandle, point: Vec2) -> bool {
        let Some(index) = self.resolve(handle) else {
            return false;
        };
        let entry = self.entries[index];
        if entry.kind != BodyKind::Dynamic {
            return false;
        }
        self.end_drag();
        let Some(body) = self.rigid_body_set.get_mut(entry.handle) else {
            return false;
        };
        let target = to_sim(point);
        let offset = body.translation() - target;
        body.set_body_type(RigidBodyType::KinematicPositionBased, true);
        body.set_angvel(0.0, true);
        body.set_next_kinematic_translation(target + offset);
        self.drag = Some(Drag {
            entry: index,
            offset,
            target,
            velocity: Vector::zeros(),
        });
        log::debug!("Drag started on body {index}");
        true
    }

    fn drag_to(&mut self, point: Vec2) {
        if let Some(drag) = self.drag.as_mut() {
            drag.target = to_sim(point);
        }
    }

    fn end_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let Some(entry) = self.entries.get(drag.entry) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(entry.handle) {
            body.set_body_type(RigidBodyType::Dynamic, true);
            // Throw with the pointer's last velocity
            body.set_linvel(drag.velocity, true);
        }
    }

    fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn clear(&mut self) {
        self.reset_sets();
        self.entries.clear();
        self.drag = None;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;
    use crate::consts::PHYSICS_DT;
    use crate::sim::physics::Material;

    fn world_with_floor() -> RapierWorld {
        let mut world = RapierWorld::create(Vec2::new(0.0, 1800.0)).unwrap();
        // Floor top at y = 600
        world.add_body(BodyDesc::static_from_rect(&Rect::new(-500.0, 600.0, 2000.0, 100.0)));
        world
    }

    fn run(world: &mut RapierWorld, seconds: f32) {
        let steps = (seconds / PHYSICS_DT) as usize;
        for _ in 0..steps {
            world.step(PHYSICS_DT);
        }
    }

    #[test]
    fn test_non_finite_gravity_fails() {
        assert!(RapierWorld::create(Vec2::new(0.0, f32::NAN)).is_err());
    }

    #[test]
    fn test_box_falls_and_rests_on_floor() {
        let mut world = world_with_floor();
        let h = world.add_body(BodyDesc::dynamic_from_rect(
            &Rect::new(100.0, 100.0, 80.0, 40.0),
            Material::default(),
        ));
        run(&mut world, 3.0);
        let pose = world.query_body(h).unwrap();
        // Resting center is half the height above the floor top
        assert!((pose.position.y - 580.0).abs() < 3.0, "y = {}", pose.position.y);
        assert!(pose.angle.abs() < 0.05);
    }

    #[test]
    fn test_stacked_boxes_do_not_sink() {
        let mut world = world_with_floor();
        let low = world.add_body(BodyDesc::dynamic_from_rect(
            &Rect::new(100.0, 500.0, 100.0, 50.0),
            Material::default(),
        ));
        let high = world.add_body(BodyDesc::dynamic_from_rect(
            &Rect::new(110.0, 400.0, 80.0, 50.0),
            Material::default(),
        ));
        run(&mut world, 3.0);
        let low = world.query_body(low).unwrap();
        let high = world.query_body(high).unwrap();
        assert!(high.position.y < low.position.y - 40.0);
        assert!(low.position.y < 600.0);
    }

    #[test]
    fn test_thin_pile_stays_above_floor() {
        let mut world = world_with_floor();
        let handles: Vec<_> = (0..40)
            .map(|i| {
                let rect = Rect::new(50.0 + (i % 4) as f32 * 240.0, (i / 4) as f32 * 40.0, 230.0, 12.0);
                world.add_body(BodyDesc::dynamic_from_rect(&rect, Material::default()))
            })
            .collect();
        run(&mut world, 6.0);
        for h in handles {
            let y = world.query_body(h).unwrap().position.y;
            assert!(y < 600.0, "body sank to y = {y}");
        }
    }

    #[test]
    fn test_same_group_passes_through() {
        let mut world = RapierWorld::create(Vec2::ZERO).unwrap();
        let a = world.add_body(
            BodyDesc::dynamic_from_rect(&Rect::new(0.0, 0.0, 20.0, 100.0), Material::default())
                .with_group(1),
        );
        let b = world.add_body(
            BodyDesc::dynamic_from_rect(&Rect::new(5.0, 10.0, 10.0, 30.0), Material::default())
                .with_group(1),
        );
        let before = (world.query_body(a).unwrap(), world.query_body(b).unwrap());
        run(&mut world, 0.5);
        let after = (world.query_body(a).unwrap(), world.query_body(b).unwrap());
        assert!(after.0.position.distance(before.0.position) < 1e-3);
        assert!(after.1.position.distance(before.1.position) < 1e-3);
    }

    #[test]
    fn test_clear_makes_handles_stale() {
        let mut world = world_with_floor();
        let h = world.add_body(BodyDesc::dynamic_from_rect(
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            Material::default(),
        ));
        assert_eq!(world.dynamic_count(), 1);
        world.clear();
        assert!(world.query_body(h).is_none());
        assert_eq!(world.dynamic_count(), 0);
        let h2 = world.add_body(BodyDesc::dynamic_from_rect(
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            Material::default(),
        ));
        assert!(world.query_body(h).is_none());
        assert!(world.query_body(h2).is_some());
    }

    #[test]
    fn test_pick_and_drag() {
        let mut world = RapierWorld::create(Vec2::ZERO).unwrap();
        world.add_body(BodyDesc::static_from_rect(&Rect::new(0.0, 0.0, 50.0, 50.0)));
        let h = world.add_body(BodyDesc::dynamic_from_rect(
            &Rect::new(200.0, 200.0, 40.0, 40.0),
            Material::default(),
        ));
        assert!(world.pick(Vec2::new(25.0, 25.0)).is_none());
        let picked = world.pick(Vec2::new(220.0, 220.0)).expect("hit");
        assert_eq!(picked, h);

        assert!(world.begin_drag(picked, Vec2::new(220.0, 220.0)));
        assert_eq!(world.dynamic_count(), 1);
        world.drag_to(Vec2::new(400.0, 220.0));
        run(&mut world, 2.0);
        let pose = world.query_body(h).unwrap();
        assert!(pose.position.x > 350.0, "x = {}", pose.position.x);

        world.end_drag();
        assert!(!world.is_dragging());
    }
}

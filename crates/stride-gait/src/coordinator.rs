use crate::{FootStepController, GaitPolicy};
use stride_core::{GroundProbe, TransformStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    pub fn other(self) -> Self {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Foot::Left => 0,
            Foot::Right => 1,
        }
    }
}

/// What happened to each foot during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaitEvents {
    pub started: [bool; 2],
    pub landed: [bool; 2],
}

impl GaitEvents {
    pub fn started(&self, foot: Foot) -> bool {
        self.started[foot.index()]
    }

    pub fn landed(&self, foot: Foot) -> bool {
        self.landed[foot.index()]
    }
}

/// Decides which foot may start a step each tick.
#[derive(Debug, Clone)]
pub struct GaitCoordinator {
    feet: [FootStepController; 2],
    policy: GaitPolicy,
    active: Foot,
}

impl GaitCoordinator {
    pub fn new(left: FootStepController, right: FootStepController, policy: GaitPolicy) -> Self {
        Self {
            feet: [left, right],
            policy,
            active: Foot::Left,
        }
    }

    pub fn policy(&self) -> GaitPolicy {
        self.policy
    }

    /// Foot currently allowed to start a step under `Alternating`.
    pub fn active_foot(&self) -> Foot {
        self.active
    }

    pub fn foot(&self, foot: Foot) -> &FootStepController {
        &self.feet[foot.index()]
    }

    pub fn foot_mut(&mut self, foot: Foot) -> &mut FootStepController {
        &mut self.feet[foot.index()]
    }

    pub fn feet(&self) -> &[FootStepController; 2] {
        &self.feet
    }

    pub fn any_moving(&self) -> bool {
        self.feet.iter().any(FootStepController::is_moving)
    }

    pub fn tick(&mut self, store: &mut dyn TransformStore, dt: f32) -> GaitEvents {
        let mut events = GaitEvents::default();

        match self.policy {
            GaitPolicy::Synchronous => {
                for (i, foot) in self.feet.iter_mut().enumerate() {
                    events.started[i] = foot.try_move(&*store);
                }
            }
            GaitPolicy::Alternating => {
                let i = self.active.index();
                events.started[i] = self.feet[i].try_move(&*store);
            }
        }

        for (i, foot) in self.feet.iter_mut().enumerate() {
            events.landed[i] = foot.advance(store, dt);
        }

        if self.policy == GaitPolicy::Alternating && !self.feet[self.active.index()].is_moving() {
            self.active = self.active.other();
        }

        events
    }

    /// Re-probes the terrain under both homes.
    pub fn reground(&mut self, store: &dyn TransformStore, ground: &dyn GroundProbe) {
        for foot in &mut self.feet {
            foot.home_mut().reground(store, ground);
        }
    }

    pub fn cancel_all(&mut self) {
        for foot in &mut self.feet {
            foot.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Home, StepSettings};
    use glam::Vec3;
    use stride_core::{NodeId, Transform, TransformHierarchy};

    struct Feet {
        scene: TransformHierarchy,
        homes: [NodeId; 2],
    }

    fn coordinator(policy: GaitPolicy) -> (Feet, GaitCoordinator) {
        let mut scene = TransformHierarchy::new();
        let mut feet = Vec::new();
        let mut homes = [NodeId(0); 2];
        for (i, side) in ["l", "r"].into_iter().enumerate() {
            let home = scene
                .add_node(format!("home_{side}"), None, Transform::IDENTITY)
                .unwrap();
            let target = scene
                .add_node(format!("target_{side}"), None, Transform::IDENTITY)
                .unwrap();
            homes[i] = home;
            let settings = StepSettings {
                max_step_distance: 0.3,
                move_duration: 0.1,
                ..StepSettings::default()
            };
            feet.push(
                FootStepController::new(format!("foot_{side}"), target, Home::new(home), settings)
                    .unwrap(),
            );
        }
        let right = feet.pop().unwrap();
        let left = feet.pop().unwrap();
        (Feet { scene, homes }, GaitCoordinator::new(left, right, policy))
    }

    fn push_homes(feet: &mut Feet, offset: Vec3) {
        for home in feet.homes {
            feet.scene
                .set_world(home, Transform::from_position(offset))
                .unwrap();
        }
    }

    #[test]
    fn alternating_waits_for_active_foot() {
        let (mut feet, mut gait) = coordinator(GaitPolicy::Alternating);
        push_homes(&mut feet, Vec3::new(0.0, 0.0, 1.0));

        let events = gait.tick(&mut feet.scene, 0.04);
        assert!(events.started(Foot::Left));
        assert!(!events.started(Foot::Right));
        assert_eq!(gait.active_foot(), Foot::Left);

        gait.tick(&mut feet.scene, 0.04);
        assert!(!gait.foot(Foot::Right).is_moving());

        let events = gait.tick(&mut feet.scene, 0.04);
        assert!(events.landed(Foot::Left));
        assert_eq!(gait.active_foot(), Foot::Right);

        let events = gait.tick(&mut feet.scene, 0.04);
        assert!(events.started(Foot::Right));
        assert!(!gait.foot(Foot::Left).is_moving());
    }

    #[test]
    fn alternating_hands_over_when_idle() {
        let (mut feet, mut gait) = coordinator(GaitPolicy::Alternating);
        gait.tick(&mut feet.scene, 0.016);
        assert_eq!(gait.active_foot(), Foot::Right);
        gait.tick(&mut feet.scene, 0.016);
        assert_eq!(gait.active_foot(), Foot::Left);
    }

    #[test]
    fn synchronous_steps_both_feet() {
        let (mut feet, mut gait) = coordinator(GaitPolicy::Synchronous);
        push_homes(&mut feet, Vec3::new(0.0, 0.0, 1.0));

        let events = gait.tick(&mut feet.scene, 0.04);
        assert!(events.started(Foot::Left) && events.started(Foot::Right));
        assert!(gait.feet().iter().all(FootStepController::is_moving));
    }

    #[test]
    fn cancel_all_releases_both() {
        let (mut feet, mut gait) = coordinator(GaitPolicy::Synchronous);
        push_homes(&mut feet, Vec3::new(1.0, 0.0, 0.0));
        gait.tick(&mut feet.scene, 0.01);
        assert!(gait.any_moving());
        gait.cancel_all();
        assert!(!gait.any_moving());
    }
}

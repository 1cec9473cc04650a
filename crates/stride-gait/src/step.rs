use crate::{Home, StepSettings};
use glam::{Quat, Vec3};
use stride_core::{NodeId, Result, Transform, TransformStore};

/// Quadratic arc from where a foot was to just past its home.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTrajectory {
    pub start: Transform,
    pub apex: Vec3,
    pub end: Vec3,
    pub end_rotation: Quat,
}

impl StepTrajectory {
    pub fn plan(start: Transform, home: Transform, settings: &StepSettings) -> Self {
        let toward_home = (home.position - start.position).normalize_or_zero();
        let overshoot =
            toward_home * settings.max_step_distance * settings.overshoot_fraction;
        let end = home.position + Vec3::new(overshoot.x, 0.0, overshoot.z);

        let lift = start.position.distance(end) * 0.5 * settings.highness;
        let apex = (start.position + end) * 0.5 + home.up() * lift;

        Self {
            start,
            apex,
            end,
            end_rotation: home.rotation,
        }
    }

    pub fn position(&self, t: f32) -> Vec3 {
        if t >= 1.0 {
            return self.end;
        }
        let t = t.max(0.0);
        let a = self.start.position.lerp(self.apex, t);
        let b = self.apex.lerp(self.end, t);
        a.lerp(b, t)
    }

    pub fn rotation(&self, t: f32) -> Quat {
        if t >= 1.0 {
            return self.end_rotation;
        }
        self.start.rotation.slerp(self.end_rotation, t.max(0.0))
    }

    pub fn sample(&self, t: f32) -> Transform {
        Transform::new(self.position(t), self.rotation(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootState {
    Idle,
    Stepping,
}

#[derive(Debug, Clone, Copy)]
struct ActiveStep {
    trajectory: StepTrajectory,
    elapsed: f32,
}

/// Owns one foot's IK target and moves it along an arc whenever it drifts
/// too far from home.
#[derive(Debug, Clone)]
pub struct FootStepController {
    pub name: String,
    target: NodeId,
    home: Home,
    settings: StepSettings,
    step: Option<ActiveStep>,
    steps_taken: u64,
}

impl FootStepController {
    pub fn new(
        name: impl Into<String>,
        target: NodeId,
        home: Home,
        settings: StepSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            name: name.into(),
            target,
            home,
            settings,
            step: None,
            steps_taken: 0,
        })
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    pub fn home_mut(&mut self) -> &mut Home {
        &mut self.home
    }

    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    pub fn state(&self) -> FootState {
        if self.step.is_some() {
            FootState::Stepping
        } else {
            FootState::Idle
        }
    }

    pub fn is_moving(&self) -> bool {
        self.step.is_some()
    }

    /// Completed steps since construction; cancelled steps don't count.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Fraction of the current step already covered.
    pub fn progress(&self) -> Option<f32> {
        self.step
            .map(|s| (s.elapsed / self.settings.move_duration).min(1.0))
    }

    pub fn trajectory(&self) -> Option<&StepTrajectory> {
        self.step.as_ref().map(|s| &s.trajectory)
    }

    pub fn distance_from_home(&self, store: &dyn TransformStore) -> Option<f32> {
        let target = store.world_position(self.target)?;
        let home = self.home.resolve(store)?;
        Some(target.distance(home.position))
    }

    /// Starts a step if the foot is idle and has drifted past
    /// `max_step_distance`. Returns whether a step started.
    pub fn try_move(&mut self, store: &dyn TransformStore) -> bool {
        if self.step.is_some() {
            return false;
        }
        let (Some(target), Some(home)) = (store.world(self.target), self.home.resolve(store))
        else {
            return false;
        };
        let distance = target.position.distance(home.position);
        if distance <= self.settings.max_step_distance {
            return false;
        }

        let trajectory = StepTrajectory::plan(target, home, &self.settings);
        log::debug!(
            "Foot '{}' stepping {:.3} from {:?} to {:?}",
            self.name,
            distance,
            target.position,
            trajectory.end
        );
        self.step = Some(ActiveStep {
            trajectory,
            elapsed: 0.0,
        });
        true
    }

    /// Moves the target along the current step by `dt`. Returns true on the
    /// tick the step lands.
    pub fn advance(&mut self, store: &mut dyn TransformStore, dt: f32) -> bool {
        let Some(step) = self.step.as_mut() else {
            return false;
        };
        step.elapsed += dt.max(0.0);
        let landed = step.elapsed >= self.settings.move_duration;
        let pose = if landed {
            step.trajectory.sample(1.0)
        } else {
            step.trajectory.sample(step.elapsed / self.settings.move_duration)
        };

        if let Err(err) = store.set_world(self.target, pose) {
            log::warn!("Foot '{}': cannot move target: {}", self.name, err);
            self.step = None;
            return false;
        }

        if landed {
            self.step = None;
            self.steps_taken += 1;
            log::debug!("Foot '{}' landed at {:?}", self.name, pose.position);
        }
        landed
    }

    /// Drops the current step; the target stays where it is.
    pub fn cancel(&mut self) {
        if let Some(step) = self.step.take() {
            log::debug!(
                "Foot '{}' step cancelled at {:.2}",
                self.name,
                step.elapsed / self.settings.move_duration
            );
        }
    }
}

//! Forward-and-backward reaching (FABRIK) chain solver.

use crate::Chain;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use stride_core::{Result, StrideError, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IkSettings {
    /// Maximum backward/forward sweeps per solve.
    pub iterations: u32,
    /// Leaf-to-target distance accepted as converged.
    pub tolerance: f32,
    /// Rotate the leaf with the target relative to their rest orientations.
    pub align_leaf_to_target: bool,
    /// Twist joints by the hips' yaw change since rest (legs only).
    pub compensate_hips_yaw: bool,
}

impl Default for IkSettings {
    fn default() -> Self {
        Self {
            iterations: 10,
            tolerance: 0.001,
            align_leaf_to_target: false,
            compensate_hips_yaw: true,
        }
    }
}

impl IkSettings {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(StrideError::InvalidConfiguration(
                "ik iterations must be at least 1".into(),
            ));
        }
        if self.tolerance <= 0.0 || self.tolerance.is_nan() {
            return Err(StrideError::InvalidConfiguration(format!(
                "ik tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// What the chain should reach this tick.
#[derive(Debug, Clone, Copy)]
pub struct IkGoal {
    pub target: Transform,
    pub pole: Option<Vec3>,
    pub hips_yaw_delta: f32,
}

impl IkGoal {
    pub fn new(target: Transform) -> Self {
        Self {
            target,
            pole: None,
            hips_yaw_delta: 0.0,
        }
    }

    pub fn with_pole(mut self, pole: Vec3) -> Self {
        self.pole = Some(pole);
        self
    }

    pub fn with_hips_yaw_delta(mut self, delta: f32) -> Self {
        self.hips_yaw_delta = delta;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub iterations: u32,
    pub reached: bool,
    /// Final leaf-to-target distance.
    pub distance: f32,
    /// Target was out of reach and the chain was laid out straight.
    pub extended: bool,
}

#[derive(Debug, Clone)]
pub struct Solution {
    /// New world pose per joint, root first.
    pub poses: Vec<Transform>,
    pub report: SolveReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChainIkSolver {
    pub settings: IkSettings,
}

impl ChainIkSolver {
    pub fn new(settings: IkSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Solves `chain` toward `goal`, seeding from the current joint poses.
    pub fn solve(&self, chain: &Chain, seed: &[Transform], goal: &IkGoal) -> Result<Solution> {
        if seed.len() != chain.len() || chain.is_stale() {
            return Err(StrideError::InvalidConfiguration(format!(
                "seed has {} poses for a chain of {} joints",
                seed.len(),
                chain.len()
            )));
        }

        let rest = chain.rest();
        let lengths = &rest.segment_lengths;
        let leaf = seed.len() - 1;
        let target = goal.target.position;
        let tolerance_sq = self.settings.tolerance * self.settings.tolerance;

        let mut positions: Vec<Vec3> = seed.iter().map(|t| t.position).collect();
        let root = positions[0];
        let mut iterations = 0;
        let extended = (target - root).length_squared() >= rest.total_reach * rest.total_reach;

        if extended {
            let dir = (target - root).normalize_or(rest.directions[0]);
            for i in 1..=leaf {
                positions[i] = positions[i - 1] + dir * lengths[i - 1];
            }
        } else {
            for _ in 0..self.settings.iterations {
                iterations += 1;

                // backward: pin the leaf on the target
                positions[leaf] = target;
                for i in (0..leaf).rev() {
                    positions[i] =
                        reach(positions[i + 1], positions[i], lengths[i], -rest.directions[i]);
                }

                // forward: re-pin the root
                positions[0] = root;
                for i in 1..=leaf {
                    positions[i] = reach(
                        positions[i - 1],
                        positions[i],
                        lengths[i - 1],
                        rest.directions[i - 1],
                    );
                }

                if (positions[leaf] - target).length_squared() < tolerance_sq {
                    break;
                }
            }
        }

        if let Some(pole) = goal.pole {
            bend_toward_pole(&mut positions, pole);
        }

        let mut poses = Vec::with_capacity(positions.len());
        for i in 0..leaf {
            let dir = (positions[i + 1] - positions[i]).normalize_or(rest.directions[i]);
            let mut rotation = Quat::from_rotation_arc(rest.directions[i], dir) * rest.rotations[i];
            if goal.hips_yaw_delta != 0.0 {
                rotation *= Quat::from_rotation_y(goal.hips_yaw_delta);
            }
            poses.push(Transform::new(positions[i], rotation.normalize()));
        }

        let leaf_rotation = if self.settings.align_leaf_to_target {
            (goal.target.rotation * rest.target_rotation.inverse() * rest.rotations[leaf])
                .normalize()
        } else {
            seed[leaf].rotation
        };
        poses.push(Transform::new(positions[leaf], leaf_rotation));

        let distance = (positions[leaf] - target).length();
        let report = SolveReport {
            iterations,
            reached: distance * distance < tolerance_sq,
            distance,
            extended,
        };
        log::trace!(
            "IK solve: {} iterations, distance {:.5}, extended {}",
            report.iterations,
            report.distance,
            report.extended
        );

        Ok(Solution { poses, report })
    }
}

/// Point exactly `length` from `anchor`, in the direction of `toward`.
#[inline]
fn reach(anchor: Vec3, toward: Vec3, length: f32, fallback: Vec3) -> Vec3 {
    anchor + (toward - anchor).normalize_or(fallback) * length
}

/// Rotates each interior joint about the line through its neighbours so it
/// lies on the pole's side. Segment lengths and endpoints are unchanged.
fn bend_toward_pole(positions: &mut [Vec3], pole: Vec3) {
    if positions.len() < 3 {
        return;
    }
    for i in 1..positions.len() - 1 {
        let prev = positions[i - 1];
        let axis = (positions[i + 1] - prev).normalize_or_zero();
        if axis == Vec3::ZERO {
            continue;
        }
        let joint = project_on_plane(positions[i] - prev, axis);
        let hint = project_on_plane(pole - prev, axis);
        if joint.length_squared() <= f32::EPSILON || hint.length_squared() <= f32::EPSILON {
            continue;
        }
        let angle = axis.dot(joint.cross(hint)).atan2(joint.dot(hint));
        positions[i] = Quat::from_axis_angle(axis, angle) * (positions[i] - prev) + prev;
    }
}

#[inline]
fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use stride_core::NodeId;

    fn chain_from(points: &[Vec3]) -> (Chain, Vec<Transform>) {
        let pose: Vec<Transform> = points.iter().map(|&p| Transform::from_position(p)).collect();
        let ids = (0..points.len() as u32).map(NodeId).collect();
        (Chain::from_rest_pose(ids, &pose, None, None).unwrap(), pose)
    }

    fn assert_lengths(chain: &Chain, poses: &[Transform]) {
        for (i, pair) in poses.windows(2).enumerate() {
            let d = pair[0].position.distance(pair[1].position);
            assert_abs_diff_eq!(d, chain.segment_lengths()[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn unreachable_target_extends_chain() {
        let (chain, seed) = chain_from(&[Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)]);
        let solver = ChainIkSolver::default();
        let goal = IkGoal::new(Transform::from_position(Vec3::new(2.5, 0.0, 0.0)));

        let out = solver.solve(&chain, &seed, &goal).unwrap();
        assert!(out.report.extended);
        assert_eq!(out.report.iterations, 0);
        assert!(out.poses[0].position.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(out.poses[1].position.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(out.poses[2].position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert_relative_eq!(out.report.distance, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn straight_rest_pose_with_far_target() {
        let (chain, seed) = chain_from(&[Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)]);
        let goal = IkGoal::new(Transform::from_position(Vec3::new(2.5, 0.0, 0.0)));
        let out = ChainIkSolver::default().solve(&chain, &seed, &goal).unwrap();
        assert!(out.poses[1].position.abs_diff_eq(Vec3::X, 1e-6));
        assert!(out.poses[2].position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn reachable_target_converges() {
        let (chain, seed) = chain_from(&[Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)]);
        let target = Vec3::new(1.0, 0.0, 0.0);
        let out = ChainIkSolver::default()
            .solve(&chain, &seed, &IkGoal::new(Transform::from_position(target)))
            .unwrap();

        assert!(out.report.reached);
        assert!(!out.report.extended);
        assert!(out.report.iterations <= 10);
        assert!(out.poses[2].position.abs_diff_eq(target, 1e-3));
        assert_abs_diff_eq!(out.poses[1].position.length(), 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(out.poses[1].position.distance(target), 1.0, epsilon = 2e-3);
        assert_lengths(&chain, &out.poses);
    }

    #[test]
    fn leg_reaches_forward_target() {
        let (chain, seed) = chain_from(&[
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.5, 0.05),
            Vec3::new(0.0, 0.0, 0.0),
        ]);
        let target = Vec3::new(0.0, 0.3, 0.4);
        let out = ChainIkSolver::default()
            .solve(&chain, &seed, &IkGoal::new(Transform::from_position(target)))
            .unwrap();
        assert!(out.report.reached);
        assert!(out.poses[2].position.abs_diff_eq(target, 1e-3));
        assert_lengths(&chain, &out.poses);
    }

    #[test]
    fn second_solve_is_stable() {
        let (chain, seed) = chain_from(&[
            Vec3::ZERO,
            Vec3::new(0.0, -1.0, 0.2),
            Vec3::new(0.0, -2.0, 0.0),
            Vec3::new(0.0, -2.0, 0.5),
        ]);
        let solver = ChainIkSolver::default();
        let goal = IkGoal::new(Transform::from_position(Vec3::new(0.3, -1.8, 0.9)));

        let first = solver.solve(&chain, &seed, &goal).unwrap();
        let second = solver.solve(&chain, &first.poses, &goal).unwrap();
        for (a, b) in first.poses.iter().zip(&second.poses) {
            assert!(a.position.distance(b.position) < 1e-3);
        }
        assert_lengths(&chain, &second.poses);
    }

    #[test]
    fn pole_picks_bend_side() {
        let (chain, seed) = chain_from(&[
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.5, -0.1),
            Vec3::new(0.0, 0.0, 0.0),
        ]);
        let solver = ChainIkSolver::default();
        let target = Vec3::new(0.0, 0.2, 0.0);
        let pole = Vec3::new(0.0, 0.5, 2.0);

        let free = solver
            .solve(&chain, &seed, &IkGoal::new(Transform::from_position(target)))
            .unwrap();
        assert!(free.poses[1].position.z < 0.0);

        let bent = solver
            .solve(&chain, &seed, &IkGoal::new(Transform::from_position(target)).with_pole(pole))
            .unwrap();
        assert!(bent.poses[1].position.z > 0.0);
        assert!(bent.poses[1].position.x.abs() < 1e-4);
        assert!(bent.poses[2].position.abs_diff_eq(free.poses[2].position, 1e-5));
        assert!(bent.poses[0].position.abs_diff_eq(free.poses[0].position, 1e-5));
        assert_lengths(&chain, &bent.poses);
    }

    #[test]
    fn orientation_follows_segment_direction() {
        let (chain, seed) = chain_from(&[Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0)]);
        let target = Vec3::new(1.0, 0.0, 0.0);
        let out = ChainIkSolver::default()
            .solve(&chain, &seed, &IkGoal::new(Transform::from_position(target * 3.0)))
            .unwrap();
        // rest bone axis (-Y) now maps onto +X
        let axis = out.poses[0].rotation * -Vec3::Y;
        assert!(axis.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn hips_yaw_twists_non_leaf_joints() {
        let (chain, seed) = chain_from(&[Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, -2.0, 0.0)]);
        let goal = IkGoal::new(Transform::from_position(Vec3::new(0.0, -3.0, 0.0))).with_hips_yaw_delta(0.5);
        let out = ChainIkSolver::default().solve(&chain, &seed, &goal).unwrap();
        assert!(out.poses[0].rotation.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-5));
        assert!(out.poses[1].rotation.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-5));
        assert_eq!(out.poses[2].rotation, Quat::IDENTITY);
    }

    #[test]
    fn leaf_rotation_is_kept_unless_aligned() {
        let pose = [
            Transform::from_position(Vec3::ZERO),
            Transform::new(Vec3::new(0.0, -1.0, 0.0), Quat::from_rotation_x(0.2)),
        ];
        let rest_target = Transform::from_position(Vec3::new(0.0, -1.0, 0.0));
        let chain =
            Chain::from_rest_pose(vec![NodeId(0), NodeId(1)], &pose, Some(&rest_target), None)
                .unwrap();
        let goal = IkGoal::new(Transform::new(
            Vec3::new(0.0, -1.0, 0.0),
            Quat::from_rotation_y(1.0),
        ));

        let kept = ChainIkSolver::default().solve(&chain, &pose, &goal).unwrap();
        assert_eq!(kept.poses[1].rotation, pose[1].rotation);

        let solver = ChainIkSolver::new(IkSettings {
            align_leaf_to_target: true,
            ..IkSettings::default()
        })
        .unwrap();
        let aligned = solver.solve(&chain, &pose, &goal).unwrap();
        let expected = Quat::from_rotation_y(1.0) * Quat::from_rotation_x(0.2);
        assert!(aligned.poses[1].rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn mismatched_seed_is_rejected() {
        let (chain, seed) = chain_from(&[Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)]);
        let goal = IkGoal::new(Transform::IDENTITY);
        assert!(ChainIkSolver::default().solve(&chain, &seed[..2], &goal).is_err());
    }

    #[test]
    fn settings_validation() {
        assert!(IkSettings::default().validate().is_ok());
        assert!(IkSettings { iterations: 0, ..Default::default() }.validate().is_err());
        assert!(IkSettings { tolerance: 0.0, ..Default::default() }.validate().is_err());
    }
}

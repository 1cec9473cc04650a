use glam::{Quat, Vec3};
use stride_core::{NodeId, Result, StrideError, Transform, TransformStore};

/// Rest data captured once from the skeleton's bind pose.
#[derive(Debug, Clone)]
pub struct RestPose {
    pub segment_lengths: Vec<f32>,
    pub total_reach: f32,
    /// Unit direction from each joint to its child; the leaf points at the target.
    pub directions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub target_rotation: Quat,
    pub hips_yaw: f32,
}

/// Ordered root-to-leaf joints solved together, plus their cached rest data.
#[derive(Debug, Clone)]
pub struct Chain {
    joints: Vec<NodeId>,
    rest: RestPose,
}

impl Chain {
    /// Captures rest data from explicit world poses (one per joint).
    pub fn from_rest_pose(
        joints: Vec<NodeId>,
        pose: &[Transform],
        target: Option<&Transform>,
        hips: Option<&Transform>,
    ) -> Result<Self> {
        let rest = capture_rest(&joints, pose, target, hips)?;
        Ok(Self { joints, rest })
    }

    /// Captures rest data from the store's current pose.
    pub fn from_store(
        joints: Vec<NodeId>,
        store: &dyn TransformStore,
        target: Option<NodeId>,
        hips: Option<NodeId>,
    ) -> Result<Self> {
        let pose = read_pose(&joints, store)?;
        let target = read_optional(target, store)?;
        let hips = read_optional(hips, store)?;
        Self::from_rest_pose(joints, &pose, target.as_ref(), hips.as_ref())
    }

    pub fn joints(&self) -> &[NodeId] {
        &self.joints
    }

    pub fn rest(&self) -> &RestPose {
        &self.rest
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn segment_lengths(&self) -> &[f32] {
        &self.rest.segment_lengths
    }

    pub fn total_reach(&self) -> f32 {
        self.rest.total_reach
    }

    /// Rebinds the joint handles. The rest cache is left alone until
    /// `ensure_rest` notices the mismatch.
    pub fn set_joints(&mut self, joints: Vec<NodeId>) {
        self.joints = joints;
    }

    /// True when the cached rest data no longer matches the bound joints.
    pub fn is_stale(&self) -> bool {
        self.rest.directions.len() != self.joints.len()
            || self.rest.segment_lengths.len() + 1 != self.joints.len()
    }

    /// Re-captures the rest cache from the store if it went stale.
    /// Returns whether a re-capture happened.
    pub fn ensure_rest(
        &mut self,
        store: &dyn TransformStore,
        target: Option<NodeId>,
        hips: Option<NodeId>,
    ) -> Result<bool> {
        if !self.is_stale() {
            return Ok(false);
        }
        log::debug!(
            "Chain rest cache stale ({} cached, {} joints), re-capturing",
            self.rest.directions.len(),
            self.joints.len()
        );
        let pose = read_pose(&self.joints, store)?;
        let target = read_optional(target, store)?;
        let hips = read_optional(hips, store)?;
        self.rest = capture_rest(&self.joints, &pose, target.as_ref(), hips.as_ref())?;
        Ok(true)
    }
}

fn capture_rest(
    joints: &[NodeId],
    pose: &[Transform],
    target: Option<&Transform>,
    hips: Option<&Transform>,
) -> Result<RestPose> {
    if joints.len() < 2 {
        return Err(StrideError::ChainTooShort { joints: joints.len() });
    }
    if pose.len() != joints.len() {
        return Err(StrideError::InvalidConfiguration(format!(
            "rest pose has {} entries for {} joints",
            pose.len(),
            joints.len()
        )));
    }

    let mut segment_lengths = Vec::with_capacity(joints.len() - 1);
    let mut directions = Vec::with_capacity(joints.len());
    for (index, pair) in pose.windows(2).enumerate() {
        let offset = pair[1].position - pair[0].position;
        let length = offset.length();
        if length <= f32::EPSILON {
            return Err(StrideError::DegenerateSegment { index });
        }
        segment_lengths.push(length);
        directions.push(offset / length);
    }

    let leaf = pose[pose.len() - 1];
    let leaf_dir = target
        .map(|t| (t.position - leaf.position).normalize_or(Vec3::Y))
        .unwrap_or(Vec3::Y);
    directions.push(leaf_dir);

    Ok(RestPose {
        total_reach: segment_lengths.iter().sum(),
        segment_lengths,
        directions,
        rotations: pose.iter().map(|t| t.rotation).collect(),
        target_rotation: target.map(|t| t.rotation).unwrap_or(Quat::IDENTITY),
        hips_yaw: hips.map(|t| t.yaw()).unwrap_or(0.0),
    })
}

pub(crate) fn read_pose(joints: &[NodeId], store: &dyn TransformStore) -> Result<Vec<Transform>> {
    joints
        .iter()
        .map(|&j| store.world(j).ok_or(StrideError::UnknownNode(j)))
        .collect()
}

fn read_optional(node: Option<NodeId>, store: &dyn TransformStore) -> Result<Option<Transform>> {
    node.map(|n| store.world(n).ok_or(StrideError::UnknownNode(n)))
        .transpose()
}

use crate::GroundingSettings;
use glam::Vec3;
use stride_core::{GroundProbe, NodeId, Transform, TransformStore};

/// A foot's rest anchor: a node parented under the pelvis, optionally
/// snapped onto the terrain below it.
#[derive(Debug, Clone)]
pub struct Home {
    node: NodeId,
    grounding: Option<GroundingSettings>,
    ground_height: Option<f32>,
}

impl Home {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            grounding: None,
            ground_height: None,
        }
    }

    pub fn with_grounding(mut self, grounding: GroundingSettings) -> Self {
        self.grounding = Some(grounding);
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn grounding(&self) -> Option<&GroundingSettings> {
        self.grounding.as_ref()
    }

    /// Height of the last probe hit, if the last probe hit anything.
    pub fn ground_height(&self) -> Option<f32> {
        self.ground_height
    }

    /// Probes straight down from above the projected home and caches the hit.
    /// A miss clears the cache so the home falls back to its projected height.
    pub fn reground(&mut self, store: &dyn TransformStore, ground: &dyn GroundProbe) {
        let Some(grounding) = self.grounding else {
            return;
        };
        let Some(anchor) = store.world_position(self.node) else {
            self.ground_height = None;
            return;
        };
        let origin = anchor + Vec3::Y * grounding.probe_height;
        self.ground_height = ground
            .raycast_down(origin, grounding.probe_distance, grounding.layer_mask)
            .map(|hit| hit.y);
    }

    /// World-space home for this tick.
    pub fn resolve(&self, store: &dyn TransformStore) -> Option<Transform> {
        let mut home = store.world(self.node)?;
        if let Some(height) = self.ground_height {
            home.position.y = height;
        }
        Some(home)
    }
}

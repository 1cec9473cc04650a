use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision layers a ground probe may hit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LayerMask: u32 {
        const DEFAULT = 1 << 0;
        const TERRAIN = 1 << 1;
        const PROPS = 1 << 2;
        const CHARACTER = 1 << 3;
        const WATER = 1 << 4;
    }
}

impl LayerMask {
    pub fn from_layer(index: u32) -> Self {
        Self::from_bits_retain(1 << index.min(31))
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::TERRAIN
    }
}

/// Downward probe against the host's collision world.
pub trait GroundProbe {
    /// First hit straight below `origin` within `max_distance`, restricted to `mask`.
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<Vec3>;
}

/// Infinite horizontal plane on a single layer.
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    pub height: f32,
    pub layer: LayerMask,
}

impl FlatGround {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            layer: LayerMask::TERRAIN,
        }
    }
}

impl GroundProbe for FlatGround {
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<Vec3> {
        if !mask.intersects(self.layer) {
            return None;
        }
        let drop = origin.y - self.height;
        (drop >= 0.0 && drop <= max_distance).then(|| Vec3::new(origin.x, self.height, origin.z))
    }
}

/// Nothing to stand on; every probe misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl GroundProbe for NoGround {
    fn raycast_down(&self, _origin: Vec3, _max_distance: f32, _mask: LayerMask) -> Option<Vec3> {
        None
    }
}

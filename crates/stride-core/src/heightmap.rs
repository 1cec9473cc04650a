use crate::{GroundProbe, LayerMask, Result, StrideError};
use glam::{Vec2, Vec3};

/// Regular grid of terrain heights laid out on the XZ plane.
pub struct HeightfieldGround {
    pub width: u32,
    pub depth: u32,
    pub cell_size: f32,
    /// World XZ of sample (0, 0).
    pub origin: Vec2,
    pub heights: Vec<f32>,
    pub layer: LayerMask,
}

impl HeightfieldGround {
    pub fn new(width: u32, depth: u32, cell_size: f32, origin: Vec2) -> Result<Self> {
        if width < 2 || depth < 2 {
            return Err(StrideError::InvalidConfiguration(format!(
                "heightfield needs at least 2x2 samples, got {width}x{depth}"
            )));
        }
        if cell_size <= 0.0 || cell_size.is_nan() {
            return Err(StrideError::InvalidConfiguration(format!(
                "heightfield cell size must be positive, got {cell_size}"
            )));
        }
        Ok(Self {
            width,
            depth,
            cell_size,
            origin,
            heights: vec![0.0; (width * depth) as usize],
            layer: LayerMask::TERRAIN,
        })
    }

    /// Fills every sample from `f(world_x, world_z)`.
    pub fn from_fn(
        width: u32,
        depth: u32,
        cell_size: f32,
        origin: Vec2,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<Self> {
        let mut field = Self::new(width, depth, cell_size, origin)?;
        for z in 0..depth {
            for x in 0..width {
                let wx = origin.x + x as f32 * cell_size;
                let wz = origin.y + z as f32 * cell_size;
                field.set_height(x, z, f(wx, wz));
            }
        }
        Ok(field)
    }

    pub fn get_height(&self, x: u32, z: u32) -> f32 {
        let index = (z * self.width + x) as usize;
        self.heights.get(index).copied().unwrap_or(0.0)
    }

    pub fn set_height(&mut self, x: u32, z: u32, height: f32) {
        let index = (z * self.width + x) as usize;
        if let Some(h) = self.heights.get_mut(index) {
            *h = height;
        }
    }

    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        let x = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let z = v.clamp(0.0, 1.0) * (self.depth - 1) as f32;

        let x0 = x.floor() as u32;
        let z0 = z.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let z1 = (z0 + 1).min(self.depth - 1);

        let fx = x - x0 as f32;
        let fz = z - z0 as f32;

        let h00 = self.get_height(x0, z0);
        let h10 = self.get_height(x1, z0);
        let h01 = self.get_height(x0, z1);
        let h11 = self.get_height(x1, z1);

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;

        h0 * (1.0 - fz) + h1 * fz
    }

    /// Terrain height under a world XZ position, `None` off the grid.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let extent_x = (self.width - 1) as f32 * self.cell_size;
        let extent_z = (self.depth - 1) as f32 * self.cell_size;
        let lx = x - self.origin.x;
        let lz = z - self.origin.y;
        if lx < 0.0 || lz < 0.0 || lx > extent_x || lz > extent_z {
            return None;
        }
        Some(self.sample_bilinear(lx / extent_x, lz / extent_z))
    }

    pub fn compute_normal(&self, x: u32, z: u32) -> Vec3 {
        let h_l = self.get_height(x.saturating_sub(1), z);
        let h_r = self.get_height((x + 1).min(self.width - 1), z);
        let h_d = self.get_height(x, z.saturating_sub(1));
        let h_u = self.get_height(x, (z + 1).min(self.depth - 1));

        let dx = h_r - h_l;
        let dz = h_u - h_d;

        Vec3::new(-dx, 2.0 * self.cell_size, -dz).normalize()
    }
}

impl GroundProbe for HeightfieldGround {
    fn raycast_down(&self, origin: Vec3, max_distance: f32, mask: LayerMask) -> Option<Vec3> {
        if !mask.intersects(self.layer) {
            return None;
        }
        let h = self.height_at(origin.x, origin.z)?;
        let drop = origin.y - h;
        (drop >= 0.0 && drop <= max_distance).then(|| Vec3::new(origin.x, h, origin.z))
    }
}

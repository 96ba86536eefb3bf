use glam::DVec2;

/// Vertex of a projected tile polygon.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileVertex {
    /// Disk coordinates, inside the unit circle.
    pub position: [f32; 2],
    /// Texture coordinates on the tile's circumscribed square.
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl TileVertex {
    pub fn new(position: DVec2, uv: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position: position.as_vec2().to_array(),
            uv,
            color,
        }
    }

    /// Texture coordinate of corner `i` of a regular `n`-gon.
    pub fn corner_uv(i: usize, n: usize) -> [f32; 2] {
        let angle = std::f32::consts::TAU * i as f32 / n as f32;
        [0.5 + 0.5 * angle.cos(), 0.5 + 0.5 * angle.sin()]
    }
}

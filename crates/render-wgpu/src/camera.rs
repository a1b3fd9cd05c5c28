use glam::{Mat4, Vec3};
use leashwalk_render::CameraView;

/// Linear fog between two distances from the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub start: f32,
    pub end: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: [0.62, 0.78, 0.92],
            start: 25.0,
            end: 55.0,
        }
    }
}

impl Fog {
    /// Fog that fully hides anything beyond the resident ring of chunks.
    pub fn for_chunk_size(chunk_size: f32) -> Self {
        Self {
            start: chunk_size * 1.25,
            end: chunk_size * 2.75,
            ..Self::default()
        }
    }
}

/// Camera state owned by the backend: the player's view plus the surface size.
#[derive(Debug, Clone, Copy)]
pub struct GpuCamera {
    pub view: CameraView,
    pub fog: Fog,
    width: u32,
    height: u32,
}

impl GpuCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            view: CameraView::default(),
            fog: Fog::default(),
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn eye(&self) -> Vec3 {
        self.view.eye
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view.view_projection(self.aspect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surface_keeps_finite_aspect() {
        let mut cam = GpuCamera::new(0, 0);
        assert_eq!(cam.aspect(), 1.0);
        cam.resize(1600, 900);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-6);
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn fog_scales_with_chunk_size() {
        let fog = Fog::for_chunk_size(20.0);
        assert_eq!(fog.start, 25.0);
        assert_eq!(fog.end, 55.0);
        assert!(fog.start < fog.end);
    }
}

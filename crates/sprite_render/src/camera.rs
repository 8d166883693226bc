//! Projection from the fixed internal resolution onto the window surface.
//!
//! Scene code always works in resolution space: top-left origin, y down,
//! `resolution.x` by `resolution.y` pixels. The viewport stretches that
//! virtual screen over the whole surface, optionally turned a quarter turn
//! for portrait displays.

use glam::{Mat4, Vec2, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayOrientation {
    #[default]
    Landscape,
    /// The virtual screen's top edge runs down the surface's right edge.
    Portrait,
}

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub resolution: Vec2,
    pub surface: (u32, u32),
    pub orientation: DisplayOrientation,
}

impl Viewport {
    pub fn new(resolution: Vec2, orientation: DisplayOrientation) -> Self {
        Self {
            resolution,
            surface: (resolution.x as u32, resolution.y as u32),
            orientation,
        }
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
    }

    pub fn projection(&self) -> Mat4 {
        let ortho = Mat4::orthographic_rh(
            0.0,
            self.resolution.x,
            self.resolution.y,
            0.0,
            -1.0,
            1.0,
        );
        match self.orientation {
            DisplayOrientation::Landscape => ortho,
            DisplayOrientation::Portrait => {
                Mat4::from_rotation_z(-std::f32::consts::FRAC_PI_2) * ortho
            }
        }
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }

    /// Map a surface pixel position into resolution space.
    pub fn map_pointer(&self, surface_pos: Vec2) -> Vec2 {
        let (w, h) = self.surface;
        if w == 0 || h == 0 {
            return Vec2::ZERO;
        }
        let nx = surface_pos.x / w as f32;
        let ny = surface_pos.y / h as f32;
        let normalized = match self.orientation {
            DisplayOrientation::Landscape => Vec2::new(nx, ny),
            DisplayOrientation::Portrait => Vec2::new(ny, 1.0 - nx),
        };
        normalized * self.resolution
    }

    /// Project a resolution-space point to clip space.
    pub fn to_clip(&self, point: Vec2) -> Vec2 {
        self.projection().transform_point3(Vec3::new(point.x, point.y, 0.0)).truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn landscape_maps_top_left_origin_y_down() {
        let viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Landscape);
        assert!(approx(viewport.to_clip(Vec2::ZERO), Vec2::new(-1.0, 1.0)));
        assert!(approx(viewport.to_clip(Vec2::new(480.0, 272.0)), Vec2::new(1.0, -1.0)));
        assert!(approx(viewport.to_clip(Vec2::new(240.0, 136.0)), Vec2::ZERO));
    }

    #[test]
    fn portrait_turns_virtual_screen_a_quarter() {
        let viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Portrait);
        // Virtual top-left lands on the surface's top-right.
        assert!(approx(viewport.to_clip(Vec2::ZERO), Vec2::new(1.0, 1.0)));
        // Virtual top-right lands on the surface's bottom-right.
        assert!(approx(viewport.to_clip(Vec2::new(480.0, 0.0)), Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn landscape_pointer_scales_to_resolution() {
        let mut viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Landscape);
        viewport.set_surface_size(960, 544);
        assert!(approx(viewport.map_pointer(Vec2::new(480.0, 272.0)), Vec2::new(240.0, 136.0)));
        assert!(approx(viewport.map_pointer(Vec2::new(960.0, 0.0)), Vec2::new(480.0, 0.0)));
    }

    #[test]
    fn portrait_pointer_is_inverse_of_projection() {
        let mut viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Portrait);
        viewport.set_surface_size(272, 480);
        // Surface top-right is the virtual origin.
        assert!(approx(viewport.map_pointer(Vec2::new(272.0, 0.0)), Vec2::ZERO));
        // Surface bottom-right is the virtual top-right.
        assert!(approx(viewport.map_pointer(Vec2::new(272.0, 480.0)), Vec2::new(480.0, 0.0)));
        // Surface bottom-left is the virtual bottom-right.
        assert!(approx(viewport.map_pointer(Vec2::new(0.0, 480.0)), Vec2::new(480.0, 272.0)));
    }

    #[test]
    fn zero_surface_maps_to_origin() {
        let mut viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Landscape);
        viewport.set_surface_size(0, 0);
        assert_eq!(viewport.map_pointer(Vec2::new(10.0, 10.0)), Vec2::ZERO);
    }

    #[test]
    fn uniform_matches_projection() {
        let viewport = Viewport::new(Vec2::new(480.0, 272.0), DisplayOrientation::Landscape);
        let uniform = viewport.build_uniform();
        assert_eq!(uniform.view_proj, viewport.projection().to_cols_array_2d());
    }
}

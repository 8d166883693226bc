//! Fixed-grid sprite sheets.
//!
//! A sheet slices its atlas into `frame_count` equally sized frames once, at
//! construction. Frames are laid out column-major: frame `i` lives in column
//! `i / rows`, row `i % rows`.

use glam::Vec2;
use sprite_core::Rect;

use crate::asset::AssetSource;
use crate::error::SheetError;
use crate::gfx::GraphicsContext;
use crate::sprite::{Facing, Sprite};

/// Vertical step between frames when the grid cannot be derived from the
/// atlas size.
pub const LEGACY_FALLBACK_STRIDE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGrid {
    pub frame_width: f32,
    pub frame_height: f32,
    pub frame_count: usize,
    pub fallback_stride: f32,
}

impl FrameGrid {
    pub const fn new(frame_width: f32, frame_height: f32, frame_count: usize) -> Self {
        Self {
            frame_width,
            frame_height,
            frame_count,
            fallback_stride: LEGACY_FALLBACK_STRIDE,
        }
    }

    pub const fn with_fallback_stride(mut self, stride: f32) -> Self {
        self.fallback_stride = stride;
        self
    }
}

#[derive(Debug)]
pub struct SpriteSheet {
    atlas: Sprite,
    grid: FrameGrid,
    frame_count: usize,
    rows: usize,
    columns: usize,
    frames: Vec<Option<Sprite>>,
}

impl SpriteSheet {
    /// Load the atlas at `path` and slice it. A missing atlas degrades the
    /// sheet to a single absent frame.
    pub fn load<G, A>(gfx: &mut G, assets: &A, path: &str, grid: FrameGrid) -> Self
    where
        G: GraphicsContext + ?Sized,
        A: AssetSource + ?Sized,
    {
        let atlas = Sprite::load(gfx, assets, path);
        Self::from_sprite(atlas, grid)
    }

    pub fn from_sprite(atlas: Sprite, grid: FrameGrid) -> Self {
        if atlas.is_absent() {
            log::warn!(
                "Sprite sheet has no atlas; degrading to a single empty frame ({} requested)",
                grid.frame_count
            );
            return Self {
                atlas,
                grid,
                frame_count: 1,
                rows: 0,
                columns: 0,
                frames: vec![Some(Sprite::absent())],
            };
        }

        let size = atlas.atlas_size();
        let rows = whole_cells(size.y, grid.frame_height);
        let columns = whole_cells(size.x, grid.frame_width);

        let mut sheet = Self {
            atlas,
            grid,
            frame_count: grid.frame_count,
            rows,
            columns,
            frames: Vec::with_capacity(grid.frame_count),
        };
        for index in 0..grid.frame_count {
            let clip = sheet.frame_location(index);
            let frame = match sheet.atlas.sub_image(clip) {
                Ok(frame) => Some(frame),
                Err(err) => {
                    log::warn!("Sprite sheet frame {} could not be sliced: {}", index, err);
                    None
                }
            };
            sheet.frames.push(frame);
        }
        log::debug!(
            "Sliced sprite sheet: {} frames, {} rows x {} columns",
            sheet.frame_count,
            rows,
            columns
        );
        sheet
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_width(&self) -> f32 {
        self.grid.frame_width
    }

    pub fn frame_height(&self) -> f32 {
        self.grid.frame_height
    }

    pub fn atlas(&self) -> &Sprite {
        &self.atlas
    }

    pub fn is_absent(&self) -> bool {
        self.atlas.is_absent()
    }

    pub fn frame(&self, index: usize) -> Option<&Sprite> {
        self.frames.get(index).and_then(Option::as_ref)
    }

    /// Pixel clip of frame `index` inside the atlas.
    pub fn frame_location(&self, index: usize) -> Rect {
        let (w, h) = (self.grid.frame_width, self.grid.frame_height);
        if self.rows > 0 && self.columns > 0 {
            let column = index / self.rows;
            let row = index % self.rows;
            Rect::new(column as f32 * w, row as f32 * h, w, h)
        } else {
            Rect::new(0.0, index as f32 * self.grid.fallback_stride, w, h)
        }
    }

    fn frame_mut(&mut self, index: usize) -> Result<&mut Sprite, SheetError> {
        if index >= self.frame_count {
            return Err(SheetError::InvalidFrameIndex {
                index,
                frame_count: self.frame_count,
            });
        }
        self.frames
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(SheetError::MissingFrame(index))
    }

    pub fn draw_frame<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        index: usize,
        origin: Vec2,
    ) -> Result<(), SheetError> {
        self.frame_mut(index)?.draw(gfx, origin);
        Ok(())
    }

    pub fn draw_frame_repeated<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        index: usize,
        origin: Vec2,
        repeat_w: f32,
        repeat_h: f32,
    ) -> Result<(), SheetError> {
        self.frame_mut(index)?
            .draw_repeated(gfx, origin, repeat_w, repeat_h);
        Ok(())
    }

    pub fn draw_frame_facing<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        index: usize,
        facing: Facing,
        origin: Vec2,
    ) -> Result<(), SheetError> {
        self.frame_mut(index)?.draw_facing(gfx, facing, origin);
        Ok(())
    }

    pub fn draw_frame_facing_rotated<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        index: usize,
        facing: Facing,
        origin: Vec2,
        degrees: f32,
        center: Vec2,
    ) -> Result<(), SheetError> {
        self.frame_mut(index)?
            .draw_facing_rotated(gfx, facing, origin, degrees, center);
        Ok(())
    }

    /// Destroy every frame view, then the atlas view. The atlas texture is
    /// released exactly once.
    pub fn destroy<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G) {
        for frame in self.frames.iter_mut().flatten() {
            frame.destroy(gfx);
        }
        self.frames.clear();
        self.atlas.destroy(gfx);
    }
}

fn whole_cells(extent: f32, cell: f32) -> usize {
    if cell <= 0.0 {
        return 0;
    }
    (extent / cell).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssetSource;
    use crate::recording::RecordingContext;

    fn sheet(gfx: &mut RecordingContext, w: u32, h: u32, grid: FrameGrid) -> SpriteSheet {
        let assets = MemoryAssetSource::new().with_image("sheet.png", w, h);
        SpriteSheet::load(gfx, &assets, "sheet.png", grid)
    }

    #[test]
    fn grid_is_column_major() {
        let mut gfx = RecordingContext::new();
        let sheet = sheet(&mut gfx, 128, 64, FrameGrid::new(32.0, 32.0, 8));
        assert_eq!(sheet.rows(), 2);
        assert_eq!(sheet.columns(), 4);
        assert_eq!(sheet.frame_count(), 8);
        assert_eq!(sheet.frame_location(5), Rect::new(64.0, 32.0, 32.0, 32.0));
        assert_eq!(sheet.frame_location(0), Rect::new(0.0, 0.0, 32.0, 32.0));
        assert_eq!(sheet.frame_location(1), Rect::new(0.0, 32.0, 32.0, 32.0));

        let frame = sheet.frame(5).expect("frame 5");
        assert_eq!(frame.clip(), Rect::new(64.0, 32.0, 32.0, 32.0));
        assert_eq!(frame.uv().u_min, 0.5);
        assert_eq!(frame.uv().v_min, 0.5);
    }

    #[test]
    fn frames_share_one_texture() {
        let mut gfx = RecordingContext::new();
        let sheet = sheet(&mut gfx, 64, 224, FrameGrid::new(32.0, 32.0, 14));
        assert_eq!(gfx.live_texture_count(), 1);
        let texture = sheet.atlas().atlas().expect("atlas").texture();
        for i in 0..14 {
            let frame = sheet.frame(i).expect("frame");
            assert_eq!(frame.atlas().expect("frame atlas").texture(), texture);
        }
    }

    #[test]
    fn draw_frame_rejects_index_at_frame_count() {
        let mut gfx = RecordingContext::new();
        let mut sheet = sheet(&mut gfx, 64, 16, FrameGrid::new(16.0, 16.0, 4));
        assert!(sheet.draw_frame(&mut gfx, 3, Vec2::ZERO).is_ok());
        let err = sheet
            .draw_frame(&mut gfx, 4, Vec2::ZERO)
            .expect_err("out of range");
        assert_eq!(
            err,
            SheetError::InvalidFrameIndex {
                index: 4,
                frame_count: 4
            }
        );
        assert_eq!(gfx.draws().len(), 1);
    }

    #[test]
    fn draw_frame_variants_dispatch_to_frame() {
        let mut gfx = RecordingContext::new();
        let mut sheet = sheet(&mut gfx, 64, 16, FrameGrid::new(16.0, 16.0, 4));

        sheet
            .draw_frame_repeated(&mut gfx, 1, Vec2::ZERO, 32.0, 16.0)
            .expect("repeated");
        assert_eq!(gfx.draws().len(), 2);

        sheet
            .draw_frame_facing(&mut gfx, 2, Facing::Right, Vec2::new(5.0, 5.0))
            .expect("facing");
        assert!(sheet.frame(2).expect("frame").is_flipped());

        sheet
            .draw_frame_facing_rotated(
                &mut gfx,
                0,
                Facing::Left,
                Vec2::ZERO,
                45.0,
                Vec2::splat(8.0),
            )
            .expect("rotated");
        assert_eq!(gfx.draws().len(), 4);
        assert!(sheet
            .draw_frame_facing_rotated(&mut gfx, 9, Facing::Left, Vec2::ZERO, 0.0, Vec2::ZERO)
            .is_err());
    }

    #[test]
    fn missing_atlas_degrades_to_single_absent_frame() {
        let mut gfx = RecordingContext::new();
        let assets = MemoryAssetSource::new();
        let mut sheet =
            SpriteSheet::load(&mut gfx, &assets, "player.png", FrameGrid::new(32.0, 32.0, 14));
        assert!(sheet.is_absent());
        assert_eq!(sheet.rows(), 0);
        assert_eq!(sheet.columns(), 0);
        assert_eq!(sheet.frame_count(), 1);
        assert!(sheet.draw_frame(&mut gfx, 0, Vec2::ZERO).is_ok());
        assert!(sheet.draw_frame(&mut gfx, 11, Vec2::ZERO).is_err());
        assert!(gfx.draws().is_empty());
    }

    #[test]
    fn frames_beyond_grid_are_missing() {
        let mut gfx = RecordingContext::new();
        let mut sheet = sheet(&mut gfx, 32, 32, FrameGrid::new(16.0, 16.0, 6));
        assert!(sheet.frame(3).is_some());
        assert!(sheet.frame(4).is_none());
        assert_eq!(
            sheet.draw_frame(&mut gfx, 4, Vec2::ZERO),
            Err(SheetError::MissingFrame(4))
        );
    }

    #[test]
    fn undersized_atlas_uses_fallback_stride() {
        let mut gfx = RecordingContext::new();
        // Frames wider than the atlas: no whole column fits.
        let grid = FrameGrid::new(32.0, 8.0, 3).with_fallback_stride(8.0);
        let sheet = sheet(&mut gfx, 16, 64, grid);
        assert_eq!(sheet.columns(), 0);
        assert_eq!(sheet.frame_location(2), Rect::new(0.0, 16.0, 32.0, 8.0));
        assert!(sheet.frame(0).is_none());
    }

    #[test]
    fn default_fallback_stride_is_legacy_value() {
        assert_eq!(
            FrameGrid::new(32.0, 32.0, 1).fallback_stride,
            LEGACY_FALLBACK_STRIDE
        );
    }

    #[test]
    fn destroy_releases_atlas_once() {
        let mut gfx = RecordingContext::new();
        let mut sheet = sheet(&mut gfx, 128, 64, FrameGrid::new(32.0, 32.0, 8));
        sheet.destroy(&mut gfx);
        sheet.destroy(&mut gfx);
        assert_eq!(gfx.deleted_textures().len(), 1);
        assert_eq!(gfx.live_texture_count(), 0);
        assert_eq!(gfx.take_error(), None);
        assert!(sheet.frame(0).is_none());
    }
}

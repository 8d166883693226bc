pub mod asset;
pub mod atlas;
pub mod batch;
pub mod camera;
pub mod error;
pub mod gfx;
pub mod gpu_context;
pub mod recording;
pub mod sheet;
pub mod sprite;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use asset::{AssetSource, FsAssetSource, MemoryAssetSource, PixelBuffer};
pub use atlas::{load_atlas, AtlasTexture};
pub use batch::{SpriteBatch, WgpuBatchContext};
pub use camera::{CameraUniform, DisplayOrientation, Viewport};
pub use error::{AssetError, AtlasError, GfxError, SheetError, SpriteError};
pub use gfx::{drain_errors, GraphicsContext, TextureHandle, TransformStack};
pub use gpu_context::GpuContext;
pub use recording::{DrawCommand, DrawnQuad, RecordingContext};
pub use sheet::{FrameGrid, SpriteSheet, LEGACY_FALLBACK_STRIDE};
pub use sprite::{Facing, Sprite};
pub use sprite_pipeline::SpritePipeline;
pub use texture::Texture;
pub use vertex::{QuadVertex, SpriteVertex};

//! The interactive compositing canvas.
//!
//! ## Module Structure
//!
//! ```text
//! canvas/
//! ├── raster.rs   # vello_cpu painter, premultiplied surfaces and bitmaps
//! ├── preview.rs  # studio / angled / back / dim settings and the scene transform
//! ├── render.rs   # project → surface, shared by live view and export
//! ├── input.rs    # gesture state and cursor feedback
//! └── editor.rs   # pointer-driven select / drag / resize / delete
//! ```

pub mod editor;
pub mod input;
pub mod preview;
pub mod raster;
pub mod render;

pub use editor::{Action, CanvasEditor};
pub use input::{Cursor, Gesture};
pub use preview::{Lighting, PreviewMode, PreviewSettings, ViewSide};
pub use raster::{Bitmap, Painter, Surface};
pub use render::{BitmapSource, RenderRequest, render};

//! # Mockup Studio
//!
//! Compose raster designs onto product blanks, preview the result under a few
//! presentation treatments, and export a high-resolution mockup that fits a
//! fixed byte budget.
//!
//! # Architecture: One Render Path
//!
//! The live canvas and the export share a single render function. Only the
//! scale and the selection chrome differ:
//!
//! ```text
//! project ─┐
//! preview ─┼─→ render() ─→ Surface ─┬─→ host display        (1×, chrome)
//! bitmaps ─┘                        └─→ fit_to_budget() ─→ bytes  (4×, no chrome)
//! ```
//!
//! Manipulation is a state machine over pointer events. It never touches
//! storage: each handler returns [`canvas::Action`]s and the session decides
//! what to persist.
//!
//! ```text
//! pointer ─→ CanvasEditor ─→ Vec<Action> ─→ Studio::apply_actions ─→ Registry ─→ registry.json
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Persisted model: `UploadedImage`, `DesignElement`, `MockupProject` |
//! | [`geometry`] | Coordinate mapping, handle hit-testing, resize arithmetic |
//! | [`project`] | Project operations and manual property edits |
//! | [`canvas`] | Raster surface, preview transforms, render pipeline, editor state machine |
//! | [`export`] | Encoders and the quality search that keeps exports under 15 MB |
//! | [`assets`] | Image library, URL resolution and the decoded-bitmap cache |
//! | [`registry`] | The JSON registry document and its on-disk store |
//! | [`upload`] | Validation, compression and storage collaborators, upload progress |
//! | [`session`] | `Studio`: ties library, registry and uploads together; collects notices |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | Export and asset file names |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Geometry Lives in Logical Pixels
//!
//! Element coordinates are stored in the logical canvas space (800×800 by
//! default) regardless of how large the canvas is shown or exported. Pointer
//! positions are mapped into that space on the way in and the render applies a
//! single device scale on the way out, so the stored project never depends on
//! the display.
//!
//! ## Failures Degrade, They Don't Abort
//!
//! A missing bitmap is skipped for that frame. A failed upload skips that file.
//! A failed registry write keeps the in-memory state and raises a
//! [`session::Notice`]. An export that cannot reach the budget is saved anyway
//! and flagged. Nothing in the library panics on bad input.
//!
//! ## CPU Rendering
//!
//! Frames are rasterized by `vello_cpu`, so the live view and the export go
//! through the same anti-aliased rasterizer with no GPU. Element and scene
//! transforms are `kurbo` affines. Decoding and png/jpg encoding use the
//! `image` crate; webp goes through `webp` because quality must be tunable
//! for the size search.

pub mod assets;
pub mod canvas;
pub mod config;
pub mod export;
pub mod geometry;
pub mod naming;
pub mod output;
pub mod project;
pub mod registry;
pub mod session;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

//! thumbkit composes thumbnail images.
//!
//! A [`Scene`] holds a fixed-size canvas, a background (solid color or stretched image), an
//! optional border and date stamp, and an ordered list of text and image layers. The [`Editor`]
//! mutates a scene in response to user actions, the [`Renderer`] rasterizes it on the CPU, and the
//! [`TemplateStore`] keeps named snapshots in a key-value store.
//!
//! # Data flow
//!
//! 1. **Edit**: [`Editor`] operations change the scene and publish [`ChangeEvent`]s.
//! 2. **Preview**: a [`Preview`] subscribed to those events repaints through its [`Renderer`].
//! 3. **Export**: [`Renderer::export_png`] writes the scene without the selection outline.
//! 4. **Persist**: [`TemplateStore`] serializes scenes to JSON, images embedded as data URIs.
//!
//! Properties the crate keeps:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Pure rendering**: painting never mutates the scene; identical inputs give identical pixels.
//! - **One async boundary**: image decoding runs on worker threads, but results only reach the
//!   [`ImageCache`] on the editor's thread via [`Editor::pump_decodes`].
//! - **Premultiplied RGBA8** inside [`Frame`]; PNG export converts to straight alpha.
#![forbid(unsafe_code)]

mod assets;
mod editor;
mod foundation;
mod hit;
mod render;
mod scene;
mod templates;

pub use assets::cache::{ImageCache, ImageKey};
pub use assets::datauri::{DataUri, ImageSource};
pub use assets::decode::{DecodedImage, decode_image, decode_source};
pub use assets::queue::DecodeQueue;
pub use editor::action::{EditorAction, replay};
pub use editor::controller::{DragState, Editor, MAX_NEW_IMAGE_WIDTH};
pub use editor::events::{ChangeEvent, SubscriptionId};
pub use editor::preview::Preview;
pub use foundation::core::{CanvasSize, Color, MAX_CANVAS_DIM, Point, Rect, Vec2};
pub use foundation::error::{ThumbError, ThumbResult};
pub use hit::{Viewport, hit_test, layer_bounds};
pub use render::cpu::{RenderSettings, Renderer};
pub use render::date::{DateSource, FixedDate, SystemClock, format_stamp};
pub use render::frame::{EXPORT_FILE_NAME, Frame};
pub use render::text::{EstimatedMeasure, FontBook, TextBrushRgba8, TextEngine, TextMeasure};
pub use scene::model::{
    Background, BorderOptions, DateOptions, FontSpec, ImageLayer, Layer, Scene, TextLayer,
    TextShadow, TextStroke,
};
pub use scene::patch::{ImagePatch, LayerPatch, TextPatch};
pub use templates::storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use templates::store::{TEMPLATES_KEY, Template, TemplateStore};

//! Font resolution, shaping and measuring.
//!
//! Fonts come from a [`FontBook`] (system fonts plus optional extra directories). A
//! [`TextEngine`] resolves a layer's family and weight to one face, shapes the content with
//! Parley and caches the result. When no face resolves, text is not drawn and its width falls
//! back to [`EstimatedMeasure`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use usvg::fontdb;

use crate::scene::model::TextLayer;

/// Width measurement of a text layer's content, in canvas pixels.
///
/// Shared by hit-testing and the selection outline. The measured box is always
/// `text_width(layer) x layer.font.size`, centered on the layer position.
pub trait TextMeasure {
    fn text_width(&mut self, layer: &TextLayer) -> f64;
}

/// Font-free width estimate: `chars * size * em_advance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimatedMeasure {
    pub em_advance: f64,
}

impl Default for EstimatedMeasure {
    fn default() -> Self {
        Self { em_advance: 0.55 }
    }
}

impl TextMeasure for EstimatedMeasure {
    fn text_width(&mut self, layer: &TextLayer) -> f64 {
        layer.content.chars().count() as f64 * layer.font.size.max(0.0) * self.em_advance
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Font database shared by every engine built from it.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.len())
            .finish()
    }
}

impl FontBook {
    /// System fonts only.
    pub fn system() -> Self {
        Self::with_dirs(&[])
    }

    /// System fonts plus every `.ttf`/`.otf`/`.ttc` directly inside `dirs`.
    pub fn with_dirs(dirs: &[PathBuf]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font book loaded");
        Self { db: Arc::new(db) }
    }

    /// No fonts at all. Text renders nothing and measures by estimate.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Best face for a CSS-like family name and weight, falling back to sans-serif and then to any
    /// loaded face.
    pub(crate) fn resolve(&self, family: &str, weight: u16) -> Option<fontdb::ID> {
        let mut families = Vec::<fontdb::Family<'_>>::with_capacity(2);
        families.push(match family.trim().to_ascii_lowercase().as_str() {
            "sans-serif" => fontdb::Family::SansSerif,
            "serif" => fontdb::Family::Serif,
            "monospace" => fontdb::Family::Monospace,
            "cursive" => fontdb::Family::Cursive,
            "fantasy" => fontdb::Family::Fantasy,
            _ => fontdb::Family::Name(family.trim()),
        });
        families.push(fontdb::Family::SansSerif);

        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        if let Some(id) = self.db.query(&query) {
            return Some(id);
        }

        // Generic families map to fixed names that may be missing; take the closest weight.
        let fallback = self
            .db
            .faces()
            .filter(|f| f.style == fontdb::Style::Normal)
            .min_by_key(|f| (i32::from(f.weight.0) - i32::from(weight)).abs())
            .or_else(|| self.db.faces().next())
            .map(|f| f.id);
        if fallback.is_some() {
            tracing::debug!(family, weight, "font family not found, using fallback face");
        }
        fallback
    }

    fn load_face(&self, id: fontdb::ID) -> Option<LoadedFace> {
        let weight = self.db.face(id)?.weight.0;
        let name = self
            .db
            .face(id)?
            .families
            .first()
            .map(|(name, _)| name.clone());
        self.db.with_face_data(id, |data, index| LoadedFace {
            bytes: data.to_vec(),
            index,
            weight,
            name,
        })
    }
}

fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font dir is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping font file");
        }
    }
}

struct LoadedFace {
    bytes: Vec<u8>,
    index: u32,
    weight: u16,
    name: Option<String>,
}

/// A face registered with Parley, with the matching glyph source for the rasterizer.
struct RegisteredFace {
    family_name: String,
    weight: u16,
    font: vello_cpu::peniko::FontData,
}

/// Shaped, laid-out text ready to paint. Glyph positions are relative to the layout's top-left.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) font: vello_cpu::peniko::FontData,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    content: String,
    family: String,
    size_bits: u64,
    weight: u16,
}

const SHAPE_CACHE_LIMIT: usize = 256;

/// Stateful shaper: Parley contexts plus face and layout caches.
pub struct TextEngine {
    fonts: FontBook,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    faces: HashMap<fontdb::ID, Option<Arc<RegisteredFace>>>,
    shaped: HashMap<ShapeKey, Option<Arc<ShapedText>>>,
}

impl TextEngine {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: HashMap::new(),
            shaped: HashMap::new(),
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Shape `content`, or `None` when no face is available or the size is unusable.
    pub(crate) fn shape(
        &mut self,
        content: &str,
        family: &str,
        size: f64,
        weight: u16,
    ) -> Option<Arc<ShapedText>> {
        if !size.is_finite() || size <= 0.0 {
            return None;
        }
        let key = ShapeKey {
            content: content.to_owned(),
            family: family.to_owned(),
            size_bits: size.to_bits(),
            weight,
        };
        if let Some(hit) = self.shaped.get(&key) {
            return hit.clone();
        }

        let shaped = self.shape_uncached(content, family, size as f32, weight);
        if self.shaped.len() >= SHAPE_CACHE_LIMIT {
            self.shaped.clear();
        }
        self.shaped.insert(key, shaped.clone());
        shaped
    }

    fn shape_uncached(
        &mut self,
        content: &str,
        family: &str,
        size_px: f32,
        weight: u16,
    ) -> Option<Arc<ShapedText>> {
        let Some(id) = self.fonts.resolve(family, weight) else {
            tracing::warn!(family, "no font available, text is not drawn");
            return None;
        };
        let face = self.registered_face(id)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, content, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(face.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(face.weight)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(
            TextBrushRgba8::default(),
        ));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(content);
        layout.break_all_lines(None);

        let width = f64::from(layout.width());
        let height = f64::from(layout.height());
        Some(Arc::new(ShapedText {
            layout,
            font: face.font.clone(),
            width,
            height,
        }))
    }

    fn registered_face(&mut self, id: fontdb::ID) -> Option<Arc<RegisteredFace>> {
        if let Some(face) = self.faces.get(&id) {
            return face.clone();
        }

        let registered = self.fonts.load_face(id).and_then(|loaded| {
            let families = self.font_ctx.collection.register_fonts(
                parley::fontique::Blob::from(loaded.bytes.clone()),
                None,
            );
            let mut names = Vec::with_capacity(families.len());
            for (fid, _) in &families {
                if let Some(name) = self.font_ctx.collection.family_name(*fid) {
                    names.push(name.to_owned());
                }
            }
            let family_name = loaded
                .name
                .filter(|n| names.iter().any(|r| r == n))
                .or_else(|| names.first().cloned())?;

            Some(Arc::new(RegisteredFace {
                family_name,
                weight: loaded.weight,
                font: vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(loaded.bytes),
                    loaded.index,
                ),
            }))
        });
        if registered.is_none() {
            tracing::warn!(?id, "font face could not be registered");
        }
        self.faces.insert(id, registered.clone());
        registered
    }
}

impl TextMeasure for TextEngine {
    fn text_width(&mut self, layer: &TextLayer) -> f64 {
        match self.shape(
            &layer.content,
            &layer.font.family,
            layer.font.size,
            layer.font.weight,
        ) {
            Some(shaped) => shaped.width,
            None => EstimatedMeasure::default().text_width(layer),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;

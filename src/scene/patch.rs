use serde::{Deserialize, Serialize};

use crate::{
    assets::datauri::ImageSource,
    foundation::core::Color,
    scene::model::{ImageLayer, Layer, TextLayer},
};

/// A single-field edit of one layer.
///
/// Patches are variant-specific: a [`TextPatch`] only applies to text layers and an
/// [`ImagePatch`] only to image layers, so an edit can never change a layer's kind.
///
/// JSON form: `{"layer": "text", "field": "font_size", "value": 96}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum LayerPatch {
    Text(TextPatch),
    Image(ImagePatch),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TextPatch {
    X(f64),
    Y(f64),
    Content(String),
    FontFamily(String),
    FontSize(f64),
    FontWeight(u16),
    Fill(Color),
    StrokeColor(Color),
    StrokeWidth(f64),
    ShadowEnabled(bool),
    ShadowColor(Color),
    ShadowBlur(f64),
    ShadowOffsetX(f64),
    ShadowOffsetY(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ImagePatch {
    X(f64),
    Y(f64),
    Width(f64),
    Height(f64),
    Source(ImageSource),
}

impl LayerPatch {
    /// Apply to `layer`. Returns `false` (leaving it untouched) on a kind mismatch.
    pub fn apply(&self, layer: &mut Layer) -> bool {
        match (self, layer) {
            (Self::Text(p), Layer::Text(t)) => {
                p.apply(t);
                true
            }
            (Self::Image(p), Layer::Image(i)) => {
                p.apply(i);
                true
            }
            _ => false,
        }
    }
}

impl TextPatch {
    pub fn apply(&self, t: &mut TextLayer) {
        match self {
            Self::X(v) => t.x = *v,
            Self::Y(v) => t.y = *v,
            Self::Content(v) => t.content.clone_from(v),
            Self::FontFamily(v) => t.font.family.clone_from(v),
            Self::FontSize(v) => t.font.size = *v,
            Self::FontWeight(v) => t.font.weight = *v,
            Self::Fill(v) => t.fill = *v,
            Self::StrokeColor(v) => t.stroke.color = *v,
            Self::StrokeWidth(v) => t.stroke.width = *v,
            Self::ShadowEnabled(v) => t.shadow.enabled = *v,
            Self::ShadowColor(v) => t.shadow.color = *v,
            Self::ShadowBlur(v) => t.shadow.blur = *v,
            Self::ShadowOffsetX(v) => t.shadow.offset_x = *v,
            Self::ShadowOffsetY(v) => t.shadow.offset_y = *v,
        }
    }
}

impl ImagePatch {
    pub fn apply(&self, i: &mut ImageLayer) {
        match self {
            Self::X(v) => i.x = *v,
            Self::Y(v) => i.y = *v,
            Self::Width(v) => i.width = *v,
            Self::Height(v) => i.height = *v,
            Self::Source(v) => i.source = v.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/patch.rs"]
mod tests;

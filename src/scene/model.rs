use serde::{Deserialize, Serialize};

use crate::{
    assets::datauri::ImageSource,
    foundation::core::{CanvasSize, Color, Point},
    foundation::error::{ThumbError, ThumbResult},
};

/// The complete, serializable description of a thumbnail.
///
/// A scene is plain data. The [`crate::Editor`] mutates it, the [`crate::Renderer`] paints it and
/// the [`crate::TemplateStore`] snapshots it; none of them keep hidden state inside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub canvas: CanvasSize,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub border: BorderOptions,
    #[serde(default)]
    pub date: DateOptions,
    /// Z-ordered: later layers paint over earlier ones.
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Default for Scene {
    /// A 1280x720 canvas holding one starter text layer.
    fn default() -> Self {
        let canvas = CanvasSize::default();
        let mut first = TextLayer::new_at(canvas.center());
        first.content = "Thumbnail".to_string();
        Self {
            canvas,
            background: Background::default(),
            border: BorderOptions::default(),
            date: DateOptions::default(),
            layers: vec![Layer::Text(first)],
        }
    }
}

impl Scene {
    /// A scene with no layers at all.
    pub fn empty(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            background: Background::default(),
            border: BorderOptions::default(),
            date: DateOptions::default(),
            layers: Vec::new(),
        }
    }

    pub fn validate(&self) -> ThumbResult<()> {
        self.canvas.validate()?;
        if !self.border.width.is_finite() || self.border.width < 0.0 {
            return Err(ThumbError::validation("border width must be finite and >= 0"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|e| ThumbError::validation(format!("layer {i}: {e}")))?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> ThumbResult<Self> {
        let scene: Self = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_json_pretty(&self) -> ThumbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every image this scene references, background first.
    pub fn image_sources(&self) -> impl Iterator<Item = &ImageSource> {
        self.background
            .image
            .iter()
            .chain(self.layers.iter().filter_map(|l| match l {
                Layer::Image(img) => Some(&img.source),
                Layer::Text(_) => None,
            }))
    }
}

/// Canvas background.
///
/// When `image` is set it is the active mode; `color` is retained and paints while the image has
/// not been decoded yet. Setting a color through the editor clears the image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Color::RED,
            image: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderOptions {
    pub enabled: bool,
    pub color: Color,
    /// Stroke width; the stroke straddles the canvas edge.
    pub width: f64,
}

impl Default for BorderOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::BLACK,
            width: 20.0,
        }
    }
}

/// Date stamp toggle. The date itself is never stored; it is read from the clock at paint time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOptions {
    pub enabled: bool,
}

/// One positioned visual element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Text(TextLayer),
    Image(ImageLayer),
}

impl Layer {
    /// Center point of the layer.
    pub fn position(&self) -> Point {
        match self {
            Self::Text(t) => Point::new(t.x, t.y),
            Self::Image(i) => Point::new(i.x, i.y),
        }
    }

    pub fn set_position(&mut self, p: Point) {
        match self {
            Self::Text(t) => {
                t.x = p.x;
                t.y = p.y;
            }
            Self::Image(i) => {
                i.x = p.x;
                i.y = p.y;
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }

    fn validate(&self) -> ThumbResult<()> {
        let p = self.position();
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(ThumbError::validation("position must be finite"));
        }
        match self {
            Self::Text(t) => {
                if !t.font.size.is_finite() || t.font.size <= 0.0 {
                    return Err(ThumbError::validation("font size must be finite and > 0"));
                }
                if !t.stroke.width.is_finite() || t.stroke.width < 0.0 {
                    return Err(ThumbError::validation("stroke width must be finite and >= 0"));
                }
                if !t.shadow.blur.is_finite() || t.shadow.blur < 0.0 {
                    return Err(ThumbError::validation("shadow blur must be finite and >= 0"));
                }
                Ok(())
            }
            Self::Image(i) => {
                if !i.width.is_finite() || !i.height.is_finite() || i.width < 0.0 || i.height < 0.0
                {
                    return Err(ThumbError::validation(
                        "image size must be finite and >= 0",
                    ));
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub x: f64,
    pub y: f64,
    pub content: String,
    pub font: FontSpec,
    pub fill: Color,
    #[serde(default)]
    pub stroke: TextStroke,
    #[serde(default)]
    pub shadow: TextShadow,
}

impl TextLayer {
    /// Default styling: bold 80px white text with an 8px black outline.
    pub fn new_at(center: Point) -> Self {
        Self {
            x: center.x,
            y: center.y,
            content: "New Text".to_string(),
            font: FontSpec::default(),
            fill: Color::WHITE,
            stroke: TextStroke::default(),
            shadow: TextShadow::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Family name or a CSS generic (`sans-serif`, `serif`, `monospace`, ...).
    pub family: String,
    /// Em size in pixels; also the height of the text's hit box.
    pub size: f64,
    /// CSS-style weight, 100..=900.
    pub weight: u16,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 80.0,
            weight: 700,
        }
    }
}

/// Outline drawn underneath the fill. A width of zero disables it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStroke {
    pub color: Color,
    pub width: f64,
}

impl Default for TextStroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 8.0,
        }
    }
}

impl TextStroke {
    pub fn none() -> Self {
        Self {
            width: 0.0,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub enabled: bool,
    pub color: Color,
    /// Blur amount in the canvas `shadowBlur` sense (Gaussian sigma is half of it).
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::BLACK,
            blur: 10.0,
            offset_x: 5.0,
            offset_y: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub source: ImageSource,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;

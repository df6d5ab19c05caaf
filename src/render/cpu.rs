use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect as CpuRect, Stroke};

use crate::{
    assets::{
        cache::{ImageCache, ImageKey},
        decode::DecodedImage,
    },
    foundation::{
        core::{CanvasSize, Color},
        error::{ThumbError, ThumbResult},
    },
    hit::layer_bounds,
    render::{
        blur::{blur_rgba8_premul, shadow_kernel},
        composite::{Region, over_in_place, over_region},
        date::{DateSource, SystemClock, format_stamp},
        frame::Frame,
        text::{ShapedText, TextEngine},
    },
    scene::model::{Background, BorderOptions, ImageLayer, Layer, Scene, TextLayer},
};

const DATE_MARGIN: f64 = 20.0;
const DATE_FONT_SIZE: f64 = 32.0;
const DATE_FONT_WEIGHT: u16 = 700;
const DATE_STROKE_WIDTH: f64 = 6.0;

const SELECTION_STROKE_WIDTH: f64 = 2.0;
const SELECTION_DASH: [f64; 2] = [6.0, 3.0];
const SELECTION_PAD_TEXT: f64 = 10.0;
const SELECTION_PAD_IMAGE: f64 = 5.0;

/// Renderer knobs that are not part of the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Color of the dashed selection outline.
    pub selection_color: Color,
    /// Family used for the date stamp.
    pub date_font_family: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            selection_color: Color::rgb(0x00, 0xA8, 0xFF),
            date_font_family: "sans-serif".to_string(),
        }
    }
}

/// CPU rasterizer for scenes.
///
/// Paints background, border, date stamp, layers and finally the selection outline, in that
/// order. Rendering never mutates the scene and is deterministic for identical inputs
/// (including the date the [`DateSource`] reports).
pub struct Renderer {
    settings: RenderSettings,
    text: TextEngine,
    date: Box<dyn DateSource>,
    image_paints: HashMap<ImageKey, vello_cpu::Image>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl Renderer {
    pub fn new(settings: RenderSettings, text: TextEngine) -> Self {
        Self {
            settings,
            text,
            date: Box::new(SystemClock),
            image_paints: HashMap::new(),
            ctx: None,
        }
    }

    pub fn with_date_source(mut self, date: impl DateSource + 'static) -> Self {
        self.date = Box::new(date);
        self
    }

    pub fn set_date_source(&mut self, date: impl DateSource + 'static) {
        self.date = Box::new(date);
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Rasterize `scene`. `selection` draws the dashed outline around that layer; stale indices
    /// draw nothing.
    #[tracing::instrument(skip_all, fields(
        width = scene.canvas.width,
        height = scene.canvas.height,
        layers = scene.layers.len(),
    ))]
    pub fn render(
        &mut self,
        scene: &Scene,
        images: &ImageCache,
        selection: Option<usize>,
    ) -> ThumbResult<Frame> {
        let (width, height) = canvas_dims_u16(scene.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        let mut painter = Painter {
            frame: Frame::transparent(u32::from(width), u32::from(height)),
            ctx,
            width,
            height,
            dirty: false,
        };

        self.paint_background(&mut painter, &scene.background, images)?;
        paint_border(&mut painter, &scene.border);
        if scene.date.enabled {
            self.paint_date(&mut painter)?;
        }
        for layer in &scene.layers {
            match layer {
                Layer::Text(t) => self.paint_text(&mut painter, t)?,
                Layer::Image(i) => self.paint_image(&mut painter, i, images)?,
            }
        }
        if let Some(layer) = selection.and_then(|i| scene.layers.get(i)) {
            self.paint_selection(&mut painter, layer);
        }

        painter.commit()?;
        let Painter { frame, ctx, .. } = painter;
        self.ctx = Some(ctx);
        Ok(frame)
    }

    /// The export frame: the scene with no selection outline.
    pub fn render_export(&mut self, scene: &Scene, images: &ImageCache) -> ThumbResult<Frame> {
        self.render(scene, images, None)
    }

    #[tracing::instrument(skip(self, scene, images))]
    pub fn export_png(
        &mut self,
        scene: &Scene,
        images: &ImageCache,
        path: &Path,
    ) -> ThumbResult<()> {
        let frame = self.render_export(scene, images)?;
        frame.write_png(path)?;
        tracing::debug!("exported png");
        Ok(())
    }

    fn paint_background(
        &mut self,
        p: &mut Painter,
        bg: &Background,
        images: &ImageCache,
    ) -> ThumbResult<()> {
        let canvas = p.canvas_rect();
        let decoded = bg
            .image
            .as_ref()
            .map(ImageKey::of)
            .and_then(|key| images.get(key).map(|img| (key, img)));

        match decoded {
            Some((key, img)) if img.width > 0 && img.height > 0 => {
                let paint = self.image_paint_for(key, img)?;
                let (iw, ih) = (f64::from(img.width), f64::from(img.height));
                p.ctx.set_transform(Affine::scale_non_uniform(
                    canvas.width() / iw,
                    canvas.height() / ih,
                ));
                p.ctx.set_paint(paint);
                p.ctx.fill_rect(&CpuRect::new(0.0, 0.0, iw, ih));
            }
            _ => {
                p.ctx.set_transform(Affine::IDENTITY);
                p.ctx.set_paint(cpu_color(bg.color));
                p.ctx.fill_rect(&canvas);
            }
        }
        p.dirty = true;
        Ok(())
    }

    fn paint_date(&mut self, p: &mut Painter) -> ThumbResult<()> {
        let stamp = format_stamp(self.date.today());
        let Some(shaped) = self.text.shape(
            &stamp,
            &self.settings.date_font_family,
            DATE_FONT_SIZE,
            DATE_FONT_WEIGHT,
        ) else {
            return Ok(());
        };
        let canvas = p.canvas_rect();
        let origin = (
            canvas.x1 - DATE_MARGIN - shaped.width,
            canvas.y1 - DATE_MARGIN - shaped.height,
        );
        draw_shaped(
            &mut p.ctx,
            &shaped,
            origin,
            Color::BLACK,
            Some(DATE_STROKE_WIDTH),
        );
        draw_shaped(&mut p.ctx, &shaped, origin, Color::WHITE, None);
        p.dirty = true;
        Ok(())
    }

    fn paint_text(&mut self, p: &mut Painter, t: &TextLayer) -> ThumbResult<()> {
        if t.content.is_empty() {
            return Ok(());
        }
        let Some(shaped) = self
            .text
            .shape(&t.content, &t.font.family, t.font.size, t.font.weight)
        else {
            return Ok(());
        };
        let origin = (t.x - shaped.width / 2.0, t.y - shaped.height / 2.0);
        let stroke = (t.stroke.width > 0.0).then_some(t.stroke.width);

        if t.shadow.enabled && t.shadow.color.a > 0 {
            p.commit()?;
            paint_text_shadow(p, t, &shaped, origin, stroke)?;
        }
        if let Some(w) = stroke {
            draw_shaped(&mut p.ctx, &shaped, origin, t.stroke.color, Some(w));
        }
        draw_shaped(&mut p.ctx, &shaped, origin, t.fill, None);
        p.dirty = true;
        Ok(())
    }

    fn paint_image(
        &mut self,
        p: &mut Painter,
        layer: &ImageLayer,
        images: &ImageCache,
    ) -> ThumbResult<()> {
        let key = ImageKey::of(&layer.source);
        let Some(img) = images.get(key) else {
            return Ok(());
        };
        if img.width == 0 || img.height == 0 || layer.width <= 0.0 || layer.height <= 0.0 {
            return Ok(());
        }
        let paint = self.image_paint_for(key, img)?;
        let (iw, ih) = (f64::from(img.width), f64::from(img.height));

        p.ctx.set_transform(
            Affine::translate((layer.x - layer.width / 2.0, layer.y - layer.height / 2.0))
                * Affine::scale_non_uniform(layer.width / iw, layer.height / ih),
        );
        p.ctx.set_paint(paint);
        p.ctx.fill_rect(&CpuRect::new(0.0, 0.0, iw, ih));
        p.dirty = true;
        Ok(())
    }

    fn paint_selection(&mut self, p: &mut Painter, layer: &Layer) {
        let pad = match layer {
            Layer::Text(_) => SELECTION_PAD_TEXT,
            Layer::Image(_) => SELECTION_PAD_IMAGE,
        };
        let b = layer_bounds(layer, &mut self.text).inflate(pad, pad);

        p.ctx.set_transform(Affine::IDENTITY);
        p.ctx.set_paint(cpu_color(self.settings.selection_color));
        p.ctx
            .set_stroke(Stroke::new(SELECTION_STROKE_WIDTH).with_dashes(0.0, SELECTION_DASH));
        p.ctx.stroke_rect(&CpuRect::new(b.x0, b.y0, b.x1, b.y1));
        p.dirty = true;
    }

    fn image_paint_for(
        &mut self,
        key: ImageKey,
        img: &DecodedImage,
    ) -> ThumbResult<vello_cpu::Image> {
        if let Some(paint) = self.image_paints.get(&key) {
            return Ok(paint.clone());
        }
        let pixmap = premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_paints.insert(key, paint.clone());
        Ok(paint)
    }
}

/// The frame being built plus the context collecting draws since the last commit.
struct Painter {
    frame: Frame,
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
    dirty: bool,
}

impl Painter {
    fn canvas_rect(&self) -> CpuRect {
        CpuRect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Rasterize pending draws and composite them over the frame.
    fn commit(&mut self) -> ThumbResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        over_in_place(&mut self.frame.data, pixmap.data_as_u8_slice())?;
        self.ctx.reset();
        self.dirty = false;
        Ok(())
    }
}

fn paint_border(p: &mut Painter, border: &BorderOptions) {
    if !border.enabled || border.width <= 0.0 {
        return;
    }
    let canvas = p.canvas_rect();
    p.ctx.set_transform(Affine::IDENTITY);
    p.ctx.set_paint(cpu_color(border.color));
    p.ctx.set_stroke(Stroke::new(border.width));
    p.ctx.stroke_rect(&canvas);
    p.dirty = true;
}

/// Render the shadow glyphs into a padded region, blur it, and composite it at the offset.
fn paint_text_shadow(
    p: &mut Painter,
    t: &TextLayer,
    shaped: &ShapedText,
    origin: (f64, f64),
    stroke: Option<f64>,
) -> ThumbResult<()> {
    // Taps beyond the canvas extent cannot reach a visible pixel.
    let max_radius = u32::from(p.width.max(p.height));
    let kernel = shadow_kernel(t.shadow.blur).map(|(r, sigma)| (r.min(max_radius), sigma));
    let blur_radius = kernel.map_or(0.0, |(r, _)| f64::from(r));
    let pad = blur_radius + stroke.unwrap_or(0.0) / 2.0 + 2.0;

    let sx = origin.0 + t.shadow.offset_x;
    let sy = origin.1 + t.shadow.offset_y;
    let canvas = p.canvas_rect().inflate(blur_radius, blur_radius);
    let region = CpuRect::new(
        sx - pad,
        sy - pad,
        sx + shaped.width + pad,
        sy + shaped.height + pad,
    )
    .intersect(canvas)
    .expand();
    if region.width() < 1.0 || region.height() < 1.0 {
        return Ok(());
    }

    let rw: u16 = (region.width() as u32)
        .try_into()
        .map_err(|_| ThumbError::render("shadow region exceeds u16"))?;
    let rh: u16 = (region.height() as u32)
        .try_into()
        .map_err(|_| ThumbError::render("shadow region exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(rw, rh);
    let local = (sx - region.x0, sy - region.y0);
    if let Some(w) = stroke {
        draw_shaped(&mut ctx, shaped, local, t.shadow.color, Some(w));
    }
    draw_shaped(&mut ctx, shaped, local, t.shadow.color, None);
    let mut pixmap = vello_cpu::Pixmap::new(rw, rh);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let blurred = match kernel {
        Some((radius, sigma)) => {
            blur_rgba8_premul(pixmap.data_as_u8_slice(), u32::from(rw), u32::from(rh), radius, sigma)?
        }
        None => pixmap.data_as_u8_slice().to_vec(),
    };

    // The region may extend past the canvas by the blur radius; composite only the visible part.
    let visible = region.intersect(p.canvas_rect());
    if visible.width() < 1.0 || visible.height() < 1.0 {
        return Ok(());
    }
    let crop = Region {
        x: (visible.x0 - region.x0) as u32,
        y: (visible.y0 - region.y0) as u32,
        width: visible.width() as u32,
        height: visible.height() as u32,
    };
    let cropped = crop_rgba8(&blurred, u32::from(rw), crop);
    over_region(
        &mut p.frame.data,
        p.frame.width,
        p.frame.height,
        &cropped,
        Region {
            x: visible.x0 as u32,
            y: visible.y0 as u32,
            ..crop
        },
    )
}

fn crop_rgba8(src: &[u8], src_width: u32, r: Region) -> Vec<u8> {
    let stride = src_width as usize * 4;
    let row_len = r.width as usize * 4;
    let mut out = Vec::with_capacity(row_len * r.height as usize);
    for row in r.y as usize..(r.y + r.height) as usize {
        let start = row * stride + r.x as usize * 4;
        out.extend_from_slice(&src[start..start + row_len]);
    }
    out
}

/// Draw every glyph run of `shaped` with its top-left at `origin`. `stroke` outlines instead of
/// filling.
fn draw_shaped(
    ctx: &mut vello_cpu::RenderContext,
    shaped: &ShapedText,
    origin: (f64, f64),
    color: Color,
    stroke: Option<f64>,
) {
    ctx.set_transform(Affine::translate(origin));
    ctx.set_paint(cpu_color(color));
    if let Some(w) = stroke {
        ctx.set_stroke(Stroke::new(w));
    }
    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx
                .glyph_run(&shaped.font)
                .font_size(run.run().font_size());
            if stroke.is_some() {
                builder.stroke_glyphs(glyphs);
            } else {
                builder.fill_glyphs(glyphs);
            }
        }
    }
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn canvas_dims_u16(canvas: CanvasSize) -> ThumbResult<(u16, u16)> {
    canvas.validate()?;
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| ThumbError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| ThumbError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ThumbResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ThumbError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ThumbError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ThumbError::render("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels: Vec<_> = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

use chrono::NaiveDate;

use crate::{
    assets::datauri::ImageSource,
    foundation::core::Point,
    render::{date::FixedDate, text::FontBook},
    scene::model::TextStroke,
};

use super::*;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn renderer(fonts: FontBook) -> Renderer {
    Renderer::new(RenderSettings::default(), TextEngine::new(fonts))
        .with_date_source(FixedDate(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()))
}

fn fontless() -> Renderer {
    renderer(FontBook::empty())
}

fn solid(rgba: [u8; 4], w: u32, h: u32) -> DecodedImage {
    DecodedImage::from_straight_rgba8(w, h, rgba.repeat((w * h) as usize)).unwrap()
}

fn image_layer(tag: &str, x: f64, y: f64, w: f64, h: f64) -> (ImageSource, Layer) {
    let source = ImageSource::from_uri(format!("data:image/png;base64,{tag}"));
    let layer = Layer::Image(ImageLayer {
        x,
        y,
        width: w,
        height: h,
        source: source.clone(),
    });
    (source, layer)
}

fn small_scene() -> Scene {
    Scene::empty(CanvasSize::new(200, 120).unwrap())
}

#[test]
fn empty_scene_is_the_background_color() {
    let frame = fontless()
        .render(&small_scene(), &ImageCache::new(), None)
        .unwrap();
    assert_eq!((frame.width, frame.height), (200, 120));
    assert!(frame.data.chunks_exact(4).all(|px| px == RED));
}

#[test]
fn border_is_drawn_only_when_enabled() {
    let mut scene = Scene::empty(CanvasSize::default());
    let mut r = fontless();
    let images = ImageCache::new();

    let off = r.render(&scene, &images, None).unwrap();
    assert_eq!(off.pixel(3, 360), Some(RED));

    scene.border.enabled = true;
    let on = r.render(&scene, &images, None).unwrap();
    // 20px stroke straddling the edge covers the outer 10px.
    assert_eq!(on.pixel(3, 360), Some(BLACK));
    assert_eq!(on.pixel(640, 3), Some(BLACK));
    assert_eq!(on.pixel(640, 360), Some(RED));
}

#[test]
fn zero_width_border_draws_nothing() {
    let mut scene = small_scene();
    scene.border.enabled = true;
    scene.border.width = 0.0;
    let frame = fontless().render(&scene, &ImageCache::new(), None).unwrap();
    assert_eq!(frame.pixel(0, 60), Some(RED));
}

#[test]
fn later_layers_paint_on_top() {
    let mut images = ImageCache::new();
    let (a, la) = image_layer("A", 100.0, 60.0, 40.0, 40.0);
    let (b, lb) = image_layer("B", 110.0, 60.0, 40.0, 40.0);
    images.insert(ImageKey::of(&a), solid([0, 0, 255, 255], 2, 2));
    images.insert(ImageKey::of(&b), solid([0, 255, 0, 255], 2, 2));

    let mut scene = small_scene();
    scene.layers = vec![la.clone(), lb.clone()];
    let mut r = fontless();
    let frame = r.render(&scene, &images, None).unwrap();
    assert_eq!(frame.pixel(105, 60), Some([0, 255, 0, 255]));
    assert_eq!(frame.pixel(85, 60), Some([0, 0, 255, 255]));

    scene.layers = vec![lb, la];
    let frame = r.render(&scene, &images, None).unwrap();
    assert_eq!(frame.pixel(105, 60), Some([0, 0, 255, 255]));
}

#[test]
fn image_is_stretched_to_layer_size() {
    let mut images = ImageCache::new();
    let (src, layer) = image_layer("LR", 100.0, 60.0, 100.0, 50.0);
    let halves = [[255u8, 255, 0, 255], [0, 0, 255, 255]].concat();
    images.insert(
        ImageKey::of(&src),
        DecodedImage::from_straight_rgba8(2, 1, halves).unwrap(),
    );

    let mut scene = small_scene();
    scene.layers.push(layer);
    let frame = fontless().render(&scene, &images, None).unwrap();
    assert_eq!(frame.pixel(60, 60), Some([255, 255, 0, 255]));
    assert_eq!(frame.pixel(140, 60), Some([0, 0, 255, 255]));
    assert_eq!(frame.pixel(100, 30), Some(RED));
}

#[test]
fn undecoded_image_is_skipped() {
    let (_, layer) = image_layer("missing", 100.0, 60.0, 40.0, 40.0);
    let mut scene = small_scene();
    scene.layers.push(layer);
    let frame = fontless().render(&scene, &ImageCache::new(), None).unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px == RED));
}

#[test]
fn background_image_fills_canvas_once_decoded() {
    let source = ImageSource::from_uri("data:image/png;base64,BG");
    let mut scene = small_scene();
    scene.background.image = Some(source.clone());

    let mut r = fontless();
    let mut images = ImageCache::new();
    let pending = r.render(&scene, &images, None).unwrap();
    assert_eq!(pending.pixel(10, 10), Some(RED));

    images.insert(ImageKey::of(&source), solid([0, 0, 255, 255], 1, 1));
    let ready = r.render(&scene, &images, None).unwrap();
    assert!(ready.data.chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
}

#[test]
fn selection_outline_is_drawn_but_never_exported() {
    let mut images = ImageCache::new();
    let (src, layer) = image_layer("SEL", 100.0, 60.0, 40.0, 40.0);
    images.insert(ImageKey::of(&src), solid([0, 255, 0, 255], 1, 1));
    let mut scene = small_scene();
    scene.layers.push(layer);

    let mut r = fontless();
    let selected = r.render(&scene, &images, Some(0)).unwrap();
    // Box 80..120 x 40..80 padded by 5; the first dash runs along the top edge.
    assert_eq!(selected.pixel(77, 35), Some([0x00, 0xA8, 0xFF, 255]));

    let export = r.render_export(&scene, &images).unwrap();
    assert_eq!(export.pixel(77, 35), Some(RED));
    assert_ne!(selected, export);
}

#[test]
fn stale_selection_draws_nothing() {
    let mut scene = small_scene();
    let (_, layer) = image_layer("X", 100.0, 60.0, 10.0, 10.0);
    scene.layers.push(layer);
    let mut r = fontless();
    let images = ImageCache::new();
    assert_eq!(
        r.render(&scene, &images, Some(7)).unwrap(),
        r.render(&scene, &images, None).unwrap()
    );
}

#[test]
fn rendering_is_deterministic() {
    let mut scene = Scene::default();
    scene.border.enabled = true;
    scene.date.enabled = true;
    let images = ImageCache::new();

    let mut r = renderer(FontBook::system());
    let a = r.render(&scene, &images, Some(0)).unwrap();
    let b = r.render(&scene, &images, Some(0)).unwrap();
    assert_eq!(a, b);

    let mut fresh = renderer(FontBook::system());
    assert_eq!(fresh.render(&scene, &images, Some(0)).unwrap(), a);
}

#[test]
fn oversized_canvas_is_rejected() {
    let mut scene = small_scene();
    scene.canvas = CanvasSize {
        width: 70_000,
        height: 10,
    };
    let err = fontless().render(&scene, &ImageCache::new(), None).unwrap_err();
    assert!(matches!(err, ThumbError::Validation(_)));
}

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn hello_scene(stroke: TextStroke) -> Scene {
    let mut scene = Scene::empty(CanvasSize::default());
    let mut t = TextLayer::new_at(Point::new(640.0, 360.0));
    t.content = "Hello".to_string();
    t.stroke = stroke;
    scene.layers.push(Layer::Text(t));
    scene
}

/// Count and bounding box `(x0, y0, x1, y1)` of pixels equal to `rgba`.
fn pixels_matching(frame: &Frame, rgba: [u8; 4]) -> (usize, Option<(u32, u32, u32, u32)>) {
    let mut count = 0;
    let mut bbox: Option<(u32, u32, u32, u32)> = None;
    for y in 0..frame.height {
        for x in 0..frame.width {
            if frame.pixel(x, y) != Some(rgba) {
                continue;
            }
            count += 1;
            bbox = Some(match bbox {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    (count, bbox)
}

#[test]
fn hello_is_centered_white_without_stroke() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        return;
    }
    let frame = renderer(fonts)
        .render(&hello_scene(TextStroke::none()), &ImageCache::new(), None)
        .unwrap();

    let (white, bbox) = pixels_matching(&frame, WHITE);
    assert!(white > 50, "expected glyph coverage, got {white} white pixels");
    let (x0, y0, x1, y1) = bbox.unwrap();
    let cx = f64::from(x0 + x1) / 2.0;
    assert!((cx - 640.0).abs() <= 6.0, "ink centered at x={cx}");
    assert!(y0 < 360 && y1 > 360, "ink spans y={y0}..{y1}");
    assert!(y0 > 300 && y1 < 420, "ink spans y={y0}..{y1}");

    // Red background blended with white fill only: no dark stroke pixels anywhere.
    assert!(frame.data.chunks_exact(4).all(|px| px[0] == 255));
    assert_eq!(frame.pixel(10, 10), Some(RED));
}

#[test]
fn stroke_paints_underneath_fill() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        return;
    }
    let mut r = renderer(fonts);
    let images = ImageCache::new();
    let plain = r
        .render(&hello_scene(TextStroke::none()), &images, None)
        .unwrap();
    // Wide enough to cover every stem if it were painted on top.
    let stroked = r
        .render(
            &hello_scene(TextStroke {
                color: Color::BLACK,
                width: 40.0,
            }),
            &images,
            None,
        )
        .unwrap();

    let (plain_white, _) = pixels_matching(&plain, WHITE);
    let (stroked_white, _) = pixels_matching(&stroked, WHITE);
    let (black, _) = pixels_matching(&stroked, BLACK);
    assert!(black > 0);
    assert!(
        stroked_white * 10 >= plain_white * 9,
        "fill interior lost: {stroked_white} of {plain_white} white pixels remain"
    );
}

#[test]
fn date_stamp_paints_bottom_right_only() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        return;
    }
    let mut scene = Scene::empty(CanvasSize::default());
    let mut r = renderer(fonts);
    let images = ImageCache::new();
    let plain = r.render(&scene, &images, None).unwrap();

    scene.date.enabled = true;
    let stamped = r.render(&scene, &images, None).unwrap();
    assert_ne!(plain, stamped);
    assert_eq!(stamped.pixel(10, 10), Some(RED));
    assert_eq!(stamped.pixel(640, 360), Some(RED));
    // Margin stays clear.
    assert_eq!(stamped.pixel(1275, 715), Some(RED));
}

#[test]
fn shadow_darkens_pixels_beside_the_text() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        return;
    }
    let mut scene = Scene::empty(CanvasSize::default());
    let mut t = TextLayer::new_at(Point::new(640.0, 360.0));
    t.content = "Shadow".to_string();
    scene.layers.push(Layer::Text(t.clone()));

    let mut r = renderer(fonts);
    let images = ImageCache::new();
    let flat = r.render(&scene, &images, None).unwrap();

    t.shadow.enabled = true;
    t.shadow.offset_x = 12.0;
    t.shadow.offset_y = 12.0;
    scene.layers[0] = Layer::Text(t);
    let shadowed = r.render(&scene, &images, None).unwrap();

    assert_ne!(flat, shadowed);
    let darker = flat
        .data
        .chunks_exact(4)
        .zip(shadowed.data.chunks_exact(4))
        .filter(|(a, b)| b[0] < a[0])
        .count();
    assert!(darker > 0);
}

#[test]
fn fontless_date_stamp_is_skipped() {
    let mut scene = small_scene();
    scene.date.enabled = true;
    let frame = fontless().render(&scene, &ImageCache::new(), None).unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px == RED));
}

#[test]
fn extreme_shadow_blur_still_renders() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        return;
    }
    let mut scene = Scene::empty(CanvasSize::new(96, 48).unwrap());
    let mut t = TextLayer::new_at(Point::new(48.0, 24.0));
    t.content = "Hi".to_string();
    t.font.size = 20.0;
    t.shadow.enabled = true;
    t.shadow.blur = 50_000.0;
    scene.layers.push(Layer::Text(t));
    scene.validate().unwrap();

    let frame = renderer(fonts)
        .render(&scene, &ImageCache::new(), None)
        .unwrap();
    assert_eq!((frame.width, frame.height), (96, 48));
}

#[test]
fn default_settings_use_the_selection_blue() {
    let r = fontless();
    assert_eq!(r.settings().selection_color, Color::rgb(0, 168, 255));
    assert_eq!(r.settings().date_font_family, "sans-serif");
}

use crate::foundation::core::Point;

use super::*;

fn image_layer() -> Layer {
    Layer::Image(ImageLayer {
        x: 10.0,
        y: 10.0,
        width: 100.0,
        height: 50.0,
        source: ImageSource::from_uri("data:image/png;base64,AAAA"),
    })
}

#[test]
fn text_patch_replaces_exactly_one_field() {
    let mut layer = Layer::Text(TextLayer::new_at(Point::new(1.0, 2.0)));
    let before = layer.clone();

    assert!(LayerPatch::Text(TextPatch::FontSize(120.0)).apply(&mut layer));

    let (Layer::Text(after), Layer::Text(mut expected)) = (&layer, before) else {
        unreachable!();
    };
    expected.font.size = 120.0;
    assert_eq!(*after, expected);
}

#[test]
fn mismatched_patch_is_a_no_op() {
    let mut layer = image_layer();
    let before = layer.clone();
    assert!(!LayerPatch::Text(TextPatch::Content("nope".into())).apply(&mut layer));
    assert_eq!(layer, before);

    let mut text = Layer::Text(TextLayer::new_at(Point::ZERO));
    let before = text.clone();
    assert!(!LayerPatch::Image(ImagePatch::Width(1.0)).apply(&mut text));
    assert_eq!(text, before);
}

#[test]
fn image_patch_updates_geometry() {
    let mut layer = image_layer();
    assert!(LayerPatch::Image(ImagePatch::Height(75.0)).apply(&mut layer));
    let Layer::Image(img) = layer else {
        unreachable!();
    };
    assert_eq!(img.height, 75.0);
    assert_eq!(img.width, 100.0);
}

#[test]
fn patches_parse_from_flat_json() {
    let p: LayerPatch =
        serde_json::from_str(r#"{"layer": "text", "field": "font_size", "value": 96}"#).unwrap();
    assert_eq!(p, LayerPatch::Text(TextPatch::FontSize(96.0)));

    let p: LayerPatch =
        serde_json::from_str(r##"{"layer": "text", "field": "fill", "value": "#00FF00"}"##)
            .unwrap();
    assert_eq!(p, LayerPatch::Text(TextPatch::Fill(Color::rgb(0, 255, 0))));

    let p: LayerPatch =
        serde_json::from_str(r#"{"layer": "image", "field": "x", "value": 5.5}"#).unwrap();
    assert_eq!(p, LayerPatch::Image(ImagePatch::X(5.5)));
}

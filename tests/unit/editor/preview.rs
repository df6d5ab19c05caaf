use crate::{
    foundation::core::{CanvasSize, Color},
    render::{
        cpu::RenderSettings,
        text::{FontBook, TextEngine},
    },
    scene::model::Scene,
};

use super::*;

fn preview() -> Preview {
    Preview::new(Renderer::new(
        RenderSettings::default(),
        TextEngine::new(FontBook::empty()),
    ))
}

fn editor() -> Editor {
    Editor::with_fonts(
        Scene::empty(CanvasSize::new(64, 48).unwrap()),
        FontBook::empty(),
    )
}

#[test]
fn repaints_only_after_changes() {
    let mut ed = editor();
    let mut pv = preview();
    pv.attach(&mut ed);

    pv.present(&ed).unwrap();
    pv.present(&ed).unwrap();
    assert_eq!(pv.repaint_count(), 1);
    assert!(!pv.is_dirty());

    ed.set_background_color(Color::rgb(0, 0, 255));
    assert!(pv.is_dirty());
    let frame = pv.present(&ed).unwrap();
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(pv.repaint_count(), 2);
}

#[test]
fn detached_preview_ignores_changes() {
    let mut ed = editor();
    let mut pv = preview();
    pv.attach(&mut ed);
    pv.present(&ed).unwrap();
    pv.detach(&mut ed);

    ed.set_background_color(Color::BLACK);
    assert!(!pv.is_dirty());
    pv.present(&ed).unwrap();
    assert_eq!(pv.repaint_count(), 1);
}

#[test]
fn export_writes_a_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(crate::render::frame::EXPORT_FILE_NAME);
    let ed = editor();
    preview().export_png(&ed, &path).unwrap();
    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 48));
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn last_frame_is_kept_between_presents() {
    let mut ed = editor();
    let mut pv = preview();
    assert!(pv.last_frame().is_none());
    pv.attach(&mut ed);
    pv.present(&ed).unwrap();
    assert_eq!(pv.last_frame().and_then(|f| f.pixel(0, 0)), Some([255, 0, 0, 255]));

    // Swapping the date source on the live renderer takes effect on the next repaint.
    pv.renderer_mut()
        .set_date_source(crate::render::date::FixedDate(
            chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        ));
    ed.set_date(crate::scene::model::DateOptions { enabled: true });
    pv.present(&ed).unwrap();
    assert_eq!(pv.repaint_count(), 2);
}

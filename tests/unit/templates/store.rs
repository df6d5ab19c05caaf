use crate::{
    foundation::core::{CanvasSize, Color},
    templates::storage::MemoryStorage,
};

use super::*;

fn scene_with_bg(color: Color) -> Scene {
    let mut s = Scene::default();
    s.background.color = color;
    s
}

#[test]
fn save_then_load_round_trips() {
    let store = TemplateStore::new(MemoryStorage::new());
    let mut scene = Scene::empty(CanvasSize::new(640, 360).unwrap());
    scene.border.enabled = true;
    assert!(store.save("A", &scene).unwrap());

    let all = store.load_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "A");
    assert_eq!(all[0].scene, scene);
}

#[test]
fn blank_names_are_ignored() {
    let store = TemplateStore::new(MemoryStorage::new());
    assert!(!store.save("", &Scene::default()).unwrap());
    assert!(!store.save("   ", &Scene::default()).unwrap());
    assert!(store.load_all().is_empty());
    assert_eq!(store.storage().get(TEMPLATES_KEY).unwrap(), None);
}

#[test]
fn duplicates_coexist_and_find_returns_newest() {
    let store = TemplateStore::new(MemoryStorage::new());
    store.save("A", &scene_with_bg(Color::BLACK)).unwrap();
    store.save("B", &scene_with_bg(Color::WHITE)).unwrap();
    store.save("A", &scene_with_bg(Color::WHITE)).unwrap();

    assert_eq!(store.names(), vec!["A", "B", "A"]);
    let found = store.find("A").unwrap();
    assert_eq!(found.scene.background.color, Color::WHITE);
    assert!(store.find("missing").is_none());
}

#[test]
fn delete_removes_every_exact_match() {
    let store = TemplateStore::new(MemoryStorage::new());
    store.save("A", &Scene::default()).unwrap();
    store.save("a", &Scene::default()).unwrap();
    store.save("A", &Scene::default()).unwrap();

    assert_eq!(store.delete("A").unwrap(), 2);
    assert_eq!(store.names(), vec!["a"]);
    assert_eq!(store.delete("A").unwrap(), 0);
}

#[test]
fn corrupt_storage_reads_as_empty() {
    let storage = MemoryStorage::new();
    storage.set(TEMPLATES_KEY, "{not json").unwrap();
    let store = TemplateStore::new(&storage);
    assert!(store.load_all().is_empty());

    // Saving over a corrupt list starts a fresh one.
    store.save("fresh", &Scene::default()).unwrap();
    assert_eq!(store.names(), vec!["fresh"]);
}

#[test]
fn persisted_format_is_a_json_array_of_records() {
    let store = TemplateStore::new(MemoryStorage::new());
    store.save("A", &Scene::default()).unwrap();
    let raw = store.storage().get(TEMPLATES_KEY).unwrap().unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v[0]["name"], "A");
    assert_eq!(v[0]["scene"]["canvas"]["width"], 1280);
    assert_eq!(v[0]["scene"]["layers"][0]["kind"], "text");
}

#[test]
fn fractional_positions_survive_the_store() {
    let store = TemplateStore::new(MemoryStorage::new());
    let mut scene = Scene::default();
    scene.layers[0].set_position(crate::foundation::core::Point::new(
        27.853828238199014,
        109.76763056948063,
    ));
    for i in 1..200u32 {
        let mut layer = scene.layers[0].clone();
        let f = f64::from(i);
        layer.set_position(crate::foundation::core::Point::new(
            (f * 6.389_f64).sqrt() * 50.0 / 3.0,
            f / 7.0 + 0.1 * f.sin(),
        ));
        scene.layers.push(layer);
    }
    store.save("drifted", &scene).unwrap();

    assert_eq!(store.find("drifted").unwrap().scene, scene);
}

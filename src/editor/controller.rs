use std::path::Path;

use crate::{
    assets::{
        cache::{ImageCache, ImageKey},
        datauri::ImageSource,
        decode::decode_source,
        queue::DecodeQueue,
    },
    editor::events::{ChangeEvent, SubscriptionId, Subscribers},
    foundation::{
        core::{CanvasSize, Color, Point, Vec2},
        error::ThumbResult,
    },
    hit::hit_test,
    render::{
        cpu::Renderer,
        frame::Frame,
        text::{FontBook, TextEngine, TextMeasure},
    },
    scene::{
        model::{BorderOptions, DateOptions, ImageLayer, Layer, Scene, TextLayer},
        patch::{ImagePatch, LayerPatch},
    },
    templates::store::Template,
};

/// Widest an image layer is created at; taller images keep their aspect.
pub const MAX_NEW_IMAGE_WIDTH: f64 = 300.0;

/// Pointer drag state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// Moving layer `index`; `grab` is the pointer's offset from the layer center at pointer-down.
    Dragging { index: usize, grab: Vec2 },
}

/// Owns the scene and applies every user edit to it.
///
/// Selection and drag state live here rather than in the scene, so they are never persisted.
/// Operations are total: stale or out-of-range indices behave as "nothing selected". Each
/// effective change is published to subscribers as a [`ChangeEvent`].
pub struct Editor {
    scene: Scene,
    selection: Option<usize>,
    drag: DragState,
    images: ImageCache,
    decodes: DecodeQueue,
    measure: Box<dyn TextMeasure>,
    subscribers: Subscribers,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("layers", &self.scene.layers.len())
            .field("selection", &self.selection)
            .field("drag", &self.drag)
            .field("images", &self.images.len())
            .field("pending_decodes", &self.decodes.pending())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Scene::default())
    }
}

impl Editor {
    /// Start editing `scene`. Referenced images begin decoding.
    ///
    /// Text is measured by shaping with the system fonts, the same way the [`Renderer`] sizes
    /// the selection outline, so hit boxes match what is drawn.
    pub fn new(scene: Scene) -> Self {
        Self::with_fonts(scene, FontBook::system())
    }

    pub fn with_fonts(scene: Scene, fonts: FontBook) -> Self {
        Self::with_text_measure(scene, TextEngine::new(fonts))
    }

    pub fn with_text_measure(scene: Scene, measure: impl TextMeasure + 'static) -> Self {
        let mut editor = Self {
            scene,
            selection: None,
            drag: DragState::Idle,
            images: ImageCache::new(),
            decodes: DecodeQueue::new(),
            measure: Box::new(measure),
            subscribers: Subscribers::default(),
        };
        editor.request_scene_decodes();
        editor
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The selected index, if it still names a layer.
    pub fn selection(&self) -> Option<usize> {
        self.selection.filter(|&i| i < self.scene.layers.len())
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selection().and_then(|i| self.scene.layers.get(i))
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn pending_decodes(&self) -> usize {
        self.decodes.pending()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Append a default text layer at the canvas center and select it.
    pub fn add_text_layer(&mut self) -> usize {
        let layer = Layer::Text(TextLayer::new_at(self.scene.canvas.center()));
        self.push_selected(layer)
    }

    /// Append an image layer at the canvas center and select it.
    ///
    /// The natural size is scaled down to at most [`MAX_NEW_IMAGE_WIDTH`] wide, keeping aspect.
    pub fn add_image_layer(
        &mut self,
        source: ImageSource,
        natural_width: f64,
        natural_height: f64,
    ) -> usize {
        let (width, height) = initial_image_size(natural_width, natural_height);
        self.decodes.request(&source, &self.images);
        let center = self.scene.canvas.center();
        self.push_selected(Layer::Image(ImageLayer {
            x: center.x,
            y: center.y,
            width,
            height,
            source,
        }))
    }

    /// Decode a data URI now to learn its natural size, then add it as an image layer.
    ///
    /// Nothing changes when decoding fails.
    pub fn import_image_layer(&mut self, uri: &str) -> ThumbResult<usize> {
        self.import_source(ImageSource::from_uri(uri))
    }

    /// Read an image file, embed it as a data URI and add it as an image layer.
    pub fn import_image_file(&mut self, path: &Path) -> ThumbResult<usize> {
        self.import_source(ImageSource::from_path(path)?)
    }

    fn import_source(&mut self, source: ImageSource) -> ThumbResult<usize> {
        let decoded = decode_source(&source)?;
        let (w, h) = (f64::from(decoded.width), f64::from(decoded.height));
        self.images.insert(ImageKey::of(&source), decoded);
        Ok(self.add_image_layer(source, w, h))
    }

    /// Apply `patch` to the selected layer. No-op without a selection or on a kind mismatch.
    pub fn update_selected(&mut self, patch: &LayerPatch) -> bool {
        let Some(i) = self.selection() else {
            return false;
        };
        let changed = patch.apply(&mut self.scene.layers[i]);
        if changed {
            if let LayerPatch::Image(ImagePatch::Source(src)) = patch {
                self.decodes.request(src, &self.images);
            }
            self.publish(ChangeEvent::Scene);
        }
        changed
    }

    /// Remove the selected layer and clear the selection.
    pub fn delete_selected(&mut self) -> bool {
        let Some(i) = self.selection() else {
            return false;
        };
        self.scene.layers.remove(i);
        self.selection = None;
        self.drag = DragState::Idle;
        self.publish(ChangeEvent::Scene);
        self.publish(ChangeEvent::Selection);
        true
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.scene.layers.len() {
            return false;
        }
        if self.selection() != Some(index) {
            self.selection = Some(index);
            self.publish(ChangeEvent::Selection);
        }
        true
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.publish(ChangeEvent::Selection);
        }
    }

    /// Pointer-down in canvas coordinates.
    ///
    /// Selects and starts dragging the topmost layer under `point`, returning its index. A miss
    /// clears the selection.
    pub fn begin_drag(&mut self, point: Point) -> Option<usize> {
        let hit = hit_test(point, &self.scene.layers, self.measure.as_mut());
        match hit {
            Some(index) => {
                let grab = point - self.scene.layers[index].position();
                self.drag = DragState::Dragging { index, grab };
                if self.selection() != Some(index) {
                    self.selection = Some(index);
                    self.publish(ChangeEvent::Selection);
                }
            }
            None => {
                self.drag = DragState::Idle;
                self.clear_selection();
            }
        }
        hit
    }

    /// Pointer-move. Keeps the grab offset; z-order is untouched.
    pub fn update_drag(&mut self, point: Point) -> bool {
        let DragState::Dragging { index, grab } = self.drag else {
            return false;
        };
        let Some(layer) = self.scene.layers.get_mut(index) else {
            self.drag = DragState::Idle;
            return false;
        };
        layer.set_position(point - grab);
        self.publish(ChangeEvent::Scene);
        true
    }

    /// Pointer-up or pointer-leave.
    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn set_canvas_size(&mut self, canvas: CanvasSize) -> ThumbResult<()> {
        canvas.validate()?;
        self.scene.canvas = canvas;
        self.publish(ChangeEvent::Scene);
        Ok(())
    }

    /// Solid background; clears any background image.
    pub fn set_background_color(&mut self, color: Color) {
        self.scene.background.color = color;
        self.scene.background.image = None;
        self.publish(ChangeEvent::Scene);
    }

    /// Image background, stretched to the canvas once decoded.
    pub fn set_background_image(&mut self, source: ImageSource) {
        self.decodes.request(&source, &self.images);
        self.scene.background.image = Some(source);
        self.publish(ChangeEvent::Scene);
    }

    pub fn set_border(&mut self, border: BorderOptions) {
        self.scene.border = border;
        self.publish(ChangeEvent::Scene);
    }

    pub fn set_date(&mut self, date: DateOptions) {
        self.scene.date = date;
        self.publish(ChangeEvent::Scene);
    }

    /// Replace the scene with a copy of the template's.
    pub fn apply_template(&mut self, template: &Template) {
        self.load_scene(template.scene.clone());
    }

    /// Replace the whole scene, dropping selection and drag state.
    pub fn load_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.selection = None;
        self.drag = DragState::Idle;
        self.request_scene_decodes();
        self.publish(ChangeEvent::Scene);
        self.publish(ChangeEvent::Selection);
    }

    /// Apply finished background decodes. Returns how many images became available.
    pub fn pump_decodes(&mut self) -> usize {
        let done = self.decodes.drain(&mut self.images);
        self.announce_decoded(done)
    }

    /// Block until every requested decode finished, then apply them.
    pub fn wait_for_decodes(&mut self) -> usize {
        let done = self.decodes.wait(&mut self.images);
        self.announce_decoded(done)
    }

    /// Render the current scene with its selection outline.
    pub fn render_with(&self, renderer: &mut Renderer) -> ThumbResult<Frame> {
        renderer.render(&self.scene, &self.images, self.selection())
    }

    /// Write the export PNG (no selection outline).
    pub fn export_png(&self, renderer: &mut Renderer, path: &Path) -> ThumbResult<()> {
        renderer.export_png(&self.scene, &self.images, path)
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    fn push_selected(&mut self, layer: Layer) -> usize {
        self.scene.layers.push(layer);
        let index = self.scene.layers.len() - 1;
        self.selection = Some(index);
        self.publish(ChangeEvent::Scene);
        self.publish(ChangeEvent::Selection);
        index
    }

    fn request_scene_decodes(&mut self) {
        for source in self.scene.image_sources() {
            self.decodes.request(source, &self.images);
        }
    }

    fn announce_decoded(&mut self, done: Vec<ImageKey>) -> usize {
        for key in &done {
            self.publish(ChangeEvent::ImageDecoded(*key));
        }
        done.len()
    }

    fn publish(&mut self, event: ChangeEvent) {
        tracing::debug!(?event, "editor change");
        self.subscribers.publish(event);
    }
}

fn initial_image_size(natural_width: f64, natural_height: f64) -> (f64, f64) {
    if natural_width > MAX_NEW_IMAGE_WIDTH {
        let scale = MAX_NEW_IMAGE_WIDTH / natural_width;
        (MAX_NEW_IMAGE_WIDTH, natural_height * scale)
    } else {
        (natural_width, natural_height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/controller.rs"]
mod tests;

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use crate::{
    editor::{controller::Editor, events::SubscriptionId},
    foundation::error::ThumbResult,
    render::{cpu::Renderer, frame::Frame},
};

/// Keeps a rendered frame of an editor up to date.
///
/// Attaching subscribes to the editor's change events; any event marks the preview dirty and the
/// next [`Preview::present`] repaints. Clean presents reuse the last frame.
pub struct Preview {
    renderer: Renderer,
    dirty: Rc<Cell<bool>>,
    subscription: Option<SubscriptionId>,
    frame: Option<Frame>,
    repaints: u64,
}

impl Preview {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            dirty: Rc::new(Cell::new(true)),
            subscription: None,
            frame: None,
            repaints: 0,
        }
    }

    pub fn attach(&mut self, editor: &mut Editor) {
        self.detach(editor);
        let dirty = Rc::clone(&self.dirty);
        self.subscription = Some(editor.subscribe(move |_| dirty.set(true)));
        self.dirty.set(true);
    }

    pub fn detach(&mut self, editor: &mut Editor) {
        if let Some(id) = self.subscription.take() {
            editor.unsubscribe(id);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get() || self.frame.is_none()
    }

    /// The current frame, repainting first if anything changed since the last present.
    pub fn present(&mut self, editor: &Editor) -> ThumbResult<&Frame> {
        let frame = match self.frame.take() {
            Some(frame) if !self.dirty.get() => frame,
            _ => {
                let frame = editor.render_with(&mut self.renderer)?;
                self.dirty.set(false);
                self.repaints += 1;
                tracing::debug!(repaints = self.repaints, "preview repainted");
                frame
            }
        };
        Ok(self.frame.insert(frame))
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn repaint_count(&self) -> u64 {
        self.repaints
    }

    /// Export the editor's scene without the selection outline.
    pub fn export_png(&mut self, editor: &Editor, path: &Path) -> ThumbResult<()> {
        editor.export_png(&mut self.renderer, path)
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/preview.rs"]
mod tests;

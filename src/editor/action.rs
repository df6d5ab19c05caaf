use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    assets::datauri::ImageSource,
    editor::controller::Editor,
    foundation::{
        core::{CanvasSize, Color, Point},
        error::ThumbResult,
    },
    scene::{
        model::{BorderOptions, DateOptions},
        patch::LayerPatch,
    },
};

/// A recorded editor operation, replayable from JSON.
///
/// `{"action": "add_text"}`, `{"action": "drag", "from": {"x": 100, "y": 100}, "to": {...}}`,
/// `{"action": "patch", "patch": {"layer": "text", "field": "content", "value": "Hi"}}`.
/// File paths are resolved against the directory passed to [`EditorAction::apply`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    AddText,
    AddImage { file: PathBuf },
    ImportImage { uri: String },
    Select { index: usize },
    ClearSelection,
    Patch { patch: LayerPatch },
    DeleteSelected,
    Drag { from: Point, to: Point },
    SetCanvas { width: u32, height: u32 },
    SetBackgroundColor { color: Color },
    SetBackgroundImage { file: PathBuf },
    SetBorder(BorderOptions),
    SetDate(DateOptions),
}

impl EditorAction {
    pub fn apply(&self, editor: &mut Editor, base_dir: &Path) -> ThumbResult<()> {
        match self {
            Self::AddText => {
                editor.add_text_layer();
            }
            Self::AddImage { file } => {
                editor.import_image_file(&base_dir.join(file))?;
            }
            Self::ImportImage { uri } => {
                editor.import_image_layer(uri)?;
            }
            Self::Select { index } => {
                editor.select(*index);
            }
            Self::ClearSelection => editor.clear_selection(),
            Self::Patch { patch } => {
                editor.update_selected(patch);
            }
            Self::DeleteSelected => {
                editor.delete_selected();
            }
            Self::Drag { from, to } => {
                if editor.begin_drag(*from).is_some() {
                    editor.update_drag(*to);
                }
                editor.end_drag();
            }
            Self::SetCanvas { width, height } => {
                editor.set_canvas_size(CanvasSize::new(*width, *height)?)?;
            }
            Self::SetBackgroundColor { color } => editor.set_background_color(*color),
            Self::SetBackgroundImage { file } => {
                editor.set_background_image(ImageSource::from_path(&base_dir.join(file))?);
            }
            Self::SetBorder(border) => editor.set_border(*border),
            Self::SetDate(date) => editor.set_date(*date),
        }
        Ok(())
    }
}

/// Replay `actions` in order, stopping at the first failure.
pub fn replay(editor: &mut Editor, actions: &[EditorAction], base_dir: &Path) -> ThumbResult<()> {
    for (i, action) in actions.iter().enumerate() {
        tracing::debug!(index = i, ?action, "replaying action");
        action.apply(editor, base_dir)?;
    }
    Ok(())
}

use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::ThumbResult,
    scene::model::Scene,
    templates::storage::KeyValueStorage,
};

/// Storage key holding the JSON list of templates.
pub const TEMPLATES_KEY: &str = "thumbnail_templates";

/// A named scene snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub scene: Scene,
}

/// Named scene snapshots persisted as one JSON array under [`TEMPLATES_KEY`].
///
/// Every write rewrites the whole list. Names are not unique: saving twice under one name keeps
/// both entries, and [`TemplateStore::find`] returns the newest.
#[derive(Debug)]
pub struct TemplateStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> TemplateStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Append a snapshot of `scene` under `name`.
    ///
    /// A blank name is ignored and returns `Ok(false)`.
    #[tracing::instrument(skip(self, scene))]
    pub fn save(&self, name: &str, scene: &Scene) -> ThumbResult<bool> {
        if name.trim().is_empty() {
            tracing::debug!("blank template name, nothing saved");
            return Ok(false);
        }
        let mut all = self.load_all();
        all.push(Template {
            name: name.to_owned(),
            scene: scene.clone(),
        });
        self.write(&all)?;
        Ok(true)
    }

    /// Every stored template, oldest first.
    ///
    /// An absent key, unreadable storage or corrupt JSON all read as an empty list.
    pub fn load_all(&self) -> Vec<Template> {
        let raw = match self.storage.get(TEMPLATES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "template storage unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(all) => all,
            Err(err) => {
                tracing::warn!(error = %err, "corrupt template list, treating as empty");
                Vec::new()
            }
        }
    }

    /// Remove every template named exactly `name`. Returns how many were removed.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, name: &str) -> ThumbResult<usize> {
        let mut all = self.load_all();
        let before = all.len();
        all.retain(|t| t.name != name);
        let removed = before - all.len();
        self.write(&all)?;
        Ok(removed)
    }

    /// Most recently saved template named `name`.
    pub fn find(&self, name: &str) -> Option<Template> {
        self.load_all().into_iter().rev().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.load_all().into_iter().map(|t| t.name).collect()
    }

    fn write(&self, all: &[Template]) -> ThumbResult<()> {
        let json = serde_json::to_string(all)?;
        self.storage.set(TEMPLATES_KEY, &json)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/templates/store.rs"]
mod tests;

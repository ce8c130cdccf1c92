//! WebAssembly bindings for composer-core.
//!
//! A browser view layer drives a [`WasmEditor`] with JSON-encoded
//! [`EditorCommand`]s and reads snapshots back as JSON.

use wasm_bindgen::prelude::*;

use crate::{Editor, EditorCommand, EditorConfig, ProjectDocument};

/// Initialize the composer WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    editor: Editor,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create an editor with default configuration and no scenes.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            editor: Editor::new(EditorConfig::default()),
        }
    }

    /// Run one command serialized as JSON. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is malformed or the command is
    /// rejected.
    #[wasm_bindgen(js_name = applyCommand)]
    pub fn apply_command(&mut self, json: &str) -> Result<bool, String> {
        let command: EditorCommand = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.editor.apply(command).map_err(|e| e.to_string())
    }

    /// Replace the scenes with those of a project document.
    ///
    /// # Errors
    ///
    /// Returns an error string if the document is malformed or invalid.
    #[wasm_bindgen(js_name = loadProject)]
    pub fn load_project(&mut self, json: &str) -> Result<(), String> {
        let document = ProjectDocument::from_json(json).map_err(|e| e.to_string())?;
        self.editor.set_global_aspect_ratio(document.aspect_ratio);
        self.editor.load(document.scene_list());
        Ok(())
    }

    /// Get the current scene list as JSON.
    #[wasm_bindgen(js_name = getScenesJson)]
    #[must_use]
    pub fn get_scenes_json(&self) -> String {
        serde_json::to_string(&self.editor.scenes().to_vec()).unwrap_or_default()
    }

    /// Get the active gesture's guides as JSON.
    #[wasm_bindgen(js_name = getGuidesJson)]
    #[must_use]
    pub fn get_guides_json(&self) -> String {
        serde_json::to_string(self.editor.guides()).unwrap_or_default()
    }

    /// Get the undo/redo cursor as JSON.
    #[wasm_bindgen(js_name = getHistoryJson)]
    #[must_use]
    pub fn get_history_json(&self) -> String {
        serde_json::to_string(&self.editor.history_position()).unwrap_or_default()
    }

    /// Get the selection as JSON (`null` when nothing is selected).
    #[wasm_bindgen(js_name = getSelectionJson)]
    #[must_use]
    pub fn get_selection_json(&self) -> String {
        serde_json::to_string(&self.editor.selection()).unwrap_or_default()
    }

    /// Step back.
    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    /// Step forward.
    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasm_editor_starts_empty() {
        let editor = WasmEditor::new();
        assert_eq!(editor.get_scenes_json(), "[]");
        assert_eq!(editor.get_selection_json(), "null");
    }

    #[test]
    fn apply_command_accepts_valid_json() {
        let mut editor = WasmEditor::new();
        assert_eq!(editor.apply_command(r#"{"command":"addScene"}"#), Ok(true));
        assert!(editor.get_history_json().contains("\"canUndo\":true"));
        assert!(editor.undo());
        assert_eq!(editor.get_scenes_json(), "[]");
    }

    #[test]
    fn apply_command_rejects_unknown_command() {
        let mut editor = WasmEditor::new();
        assert!(editor.apply_command(r#"{"command":"explode"}"#).is_err());
    }

    #[test]
    fn load_project_rejects_invalid_json() {
        let mut editor = WasmEditor::new();
        assert!(editor.load_project("not json").is_err());
    }
}

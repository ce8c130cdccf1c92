//! Subcommand implementations.

use std::fmt::{self, Write as _};
use std::path::Path;

use anyhow::Context;
use composer_core::{
    AspectRatio, Background, Editor, EditorCommand, ElementRef, ProjectDocument, SceneId,
    SceneList, ScenePatch, SceneStore,
};
use composer_sync::{spawn_persistence, FileSink, SceneSink};

use crate::{CliConfig, CliError};

/// Outcome of replaying a command script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Commands that changed the editor state.
    pub applied: usize,
    /// Commands that were valid but changed nothing (stale selectors,
    /// exhausted history).
    pub unchanged: usize,
    /// Commands refused with an error. Each left the project untouched.
    pub rejected: usize,
    /// Editor revision after the last command.
    pub revision: u64,
    /// Scenes whose record could not be written, with the error.
    pub failed_writes: Vec<(SceneId, String)>,
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} unchanged, {} rejected (revision {})",
            self.applied, self.unchanged, self.rejected, self.revision
        )?;
        for (scene_id, error) in &self.failed_writes {
            write!(f, "\n  write failed for scene {scene_id}: {error}")?;
        }
        Ok(())
    }
}

/// Create a project with `scene_count` empty scenes and seed its scene records.
///
/// # Errors
///
/// Fails if the name is invalid, the project already exists or the files
/// cannot be written.
pub async fn create_project(
    config: &CliConfig,
    name: &str,
    aspect_ratio: AspectRatio,
    scene_count: usize,
) -> anyhow::Result<ProjectDocument> {
    let path = config.project_path(name)?;
    if tokio::fs::try_exists(&path).await? {
        return Err(CliError::ProjectExists(path).into());
    }
    tokio::fs::create_dir_all(config.data_dir()).await?;

    let store = SceneStore::new(aspect_ratio);
    let scenes = (0..scene_count).fold(SceneList::new(), |scenes, _| store.add_scene(&scenes));
    let mut document = ProjectDocument::new(name, aspect_ratio);
    document.set_scenes(&scenes);

    let sink = FileSink::new(config.scenes_dir(name)?)?;
    for (position, scene) in scenes.iter().enumerate() {
        sink.write(scene.id, &ScenePatch::full(scene, position))
            .await
            .with_context(|| format!("Failed to seed scene {}", scene.id))?;
    }
    save_project(config, &document).await?;
    tracing::info!(
        "Created project {name} ({aspect_ratio}, {} scenes)",
        scenes.len()
    );
    Ok(document)
}

/// Read and validate a project document.
///
/// # Errors
///
/// Fails if the file is missing, unreadable or not a valid project.
pub async fn load_project(config: &CliConfig, name: &str) -> anyhow::Result<ProjectDocument> {
    let path = config.project_path(name)?;
    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = ProjectDocument::from_json(&json)
        .with_context(|| format!("Invalid project {}", path.display()))?;
    Ok(document)
}

/// Write a project document to the data directory.
///
/// # Errors
///
/// Fails if the document cannot be serialized or written.
pub async fn save_project(config: &CliConfig, document: &ProjectDocument) -> anyhow::Result<()> {
    let path = config.project_path(&document.name)?;
    let json = document.to_json()?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Replay a command script through an editor with persistence attached.
///
/// Commands run in order. A command that fails validation is logged and
/// counted; the rest of the script still runs. The project document is saved
/// once at the end and the scene records are flushed before returning.
///
/// # Errors
///
/// Fails if the project or script cannot be read or parsed, or the project
/// cannot be saved.
pub async fn apply_script(
    config: &CliConfig,
    name: &str,
    script: &Path,
) -> anyhow::Result<ApplyReport> {
    let mut document = load_project(config, name).await?;
    let script_json = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let commands: Vec<EditorCommand> = serde_json::from_str(&script_json)
        .with_context(|| format!("Invalid command script {}", script.display()))?;

    let sink = FileSink::new(config.scenes_dir(name)?)?;
    let persistence = spawn_persistence(sink, &config.sync);

    let mut editor_config = config.editor.clone();
    editor_config.aspect_ratio = document.aspect_ratio;
    let mut editor = Editor::with_scenes(editor_config, document.scene_list());
    editor.set_on_change(persistence.notifier());

    let mut report = ApplyReport::default();
    for (index, command) in commands.into_iter().enumerate() {
        match editor.apply(command) {
            Ok(true) => report.applied += 1,
            Ok(false) => report.unchanged += 1,
            Err(e) => {
                tracing::warn!("Command #{index} rejected: {e}");
                report.rejected += 1;
            }
        }
    }
    report.revision = editor.revision();

    document.set_scenes(editor.scenes());
    save_project(config, &document).await?;

    persistence.flush().await?;
    report.failed_writes = persistence.parked().await?;
    persistence.shutdown().await?;

    tracing::info!("Applied script to {name}: {report}");
    Ok(report)
}

/// Rebuild a project document from its scene records.
///
/// Project metadata is kept when the existing document is readable.
///
/// # Errors
///
/// Fails if the scene records cannot be read or do not form a valid project.
pub async fn recover_project(config: &CliConfig, name: &str) -> anyhow::Result<ProjectDocument> {
    let mut document = match load_project(config, name).await {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Starting from a blank document for {name}: {e:#}");
            ProjectDocument::new(name, config.editor.aspect_ratio)
        }
    };
    let sink = FileSink::new(config.scenes_dir(name)?)?;
    let scenes = sink.load_all().await?;
    document.set_scenes(&SceneList::from(scenes));
    document.validate()?;
    save_project(config, &document).await?;
    tracing::info!(
        "Recovered {name} with {} scenes",
        document.scenes.len()
    );
    Ok(document)
}

/// Human-readable project overview, one line per scene and element.
#[must_use]
pub fn summarize(document: &ProjectDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}, {:?}, {} scenes)",
        document.name,
        document.aspect_ratio,
        document.status,
        document.scenes.len()
    );
    for (index, scene) in document.scenes.iter().enumerate() {
        let title = if scene.title.is_empty() {
            "(untitled)"
        } else {
            scene.title.as_str()
        };
        let background = match &scene.background {
            Background::Color { color } => format!("color {color}"),
            Background::Image { src } => format!("image {src}"),
            Background::Video { src } => format!("video {src}"),
        };
        let _ = writeln!(
            out,
            "  [{index}] {title} {} bg={background}",
            scene.aspect_ratio
        );
        for element in scene.elements_by_layer() {
            let frame = element.frame();
            let label = match element {
                ElementRef::Text(text) => format!("{:?}", text.content),
                ElementRef::Media(_) | ElementRef::Avatar(_) => String::new(),
            };
            let _ = writeln!(
                out,
                "      z={} {} {}x{} at ({}, {}) {label}",
                element.z_index(),
                element.kind().name(),
                frame.width,
                frame.height,
                frame.x,
                frame.y,
            );
        }
    }
    out
}

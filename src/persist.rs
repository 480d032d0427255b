use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::assets::{ResolvedImages, rewrite_image_links};
use crate::error::{ExportError, Result};
use crate::results::ExportBundle;

/// A place export files can be written to, addressed by `/`-separated
/// relative paths. Parent folders are created as needed.
pub trait Persistence {
    fn write_file(&self, relative_path: &str, bytes: &[u8]) -> Result<()>;

    /// Human readable location, for reporting
    fn location(&self) -> String;
}

/// Writes files below a root directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    overwrite: bool,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            overwrite: true,
        }
    }

    /// Refuse to replace existing files
    pub fn without_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let relative = Path::new(relative_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative_path.is_empty() || escapes {
            return Err(ExportError::PersistenceDenied(format!(
                "path {:?} is outside the export folder",
                relative_path
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl Persistence for DirectoryStore {
    fn write_file(&self, relative_path: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| persistence_error(e, parent))?;
        }

        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&path).map_err(|e| persistence_error(e, &path))?;
        file.write_all(bytes)
            .map_err(|e| persistence_error(e, &path))?;

        ::log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Map filesystem failures onto the persistence error taxonomy
fn persistence_error(error: io::Error, path: &Path) -> ExportError {
    let detail = format!("{}: {}", path.display(), error);
    match error.kind() {
        io::ErrorKind::PermissionDenied => ExportError::PersistencePermission(detail),
        io::ErrorKind::AlreadyExists | io::ErrorKind::ReadOnlyFilesystem => {
            ExportError::PersistenceDenied(detail)
        }
        io::ErrorKind::Interrupted => ExportError::PersistenceCancelled,
        _ => ExportError::Io(error),
    }
}

/// What `save_bundle` ended up writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// `<Title>/<Title>.md` plus its images
    Folder {
        location: String,
        files: Vec<String>,
    },
    /// Only `<Title>.md`, written to the fallback target
    SingleFile { location: String, file: String },
    /// The user aborted; nothing more will be attempted
    Cancelled,
}

/// Persist the bundle as `<Title>/<Title>.md` with images under
/// `<Title>/assets/images/`.
///
/// If the primary target refuses the write, one attempt is made to write
/// only `<Title>.md` to `fallback`. Image links are rewritten to the local
/// paths in both cases.
pub fn save_bundle<P, F>(
    bundle: &ExportBundle,
    images: &ResolvedImages,
    primary: &P,
    fallback: Option<&F>,
) -> Result<SaveOutcome>
where
    P: Persistence + ?Sized,
    F: Persistence + ?Sized,
{
    let markdown = rewrite_image_links(&bundle.markdown, images);

    let error = match save_folder(bundle, &markdown, images, primary) {
        Ok(files) => {
            ::log::info!("Saved {} files to {}", files.len(), primary.location());
            return Ok(SaveOutcome::Folder {
                location: primary.location(),
                files,
            });
        }
        Err(ExportError::PersistenceCancelled) => {
            ::log::info!("Save cancelled");
            return Ok(SaveOutcome::Cancelled);
        }
        Err(e) => e,
    };

    let Some(fallback) = fallback.filter(|_| error.allows_fallback()) else {
        return Err(error);
    };
    ::log::warn!(
        "Saving to {} failed ({}), falling back to a single file in {}",
        primary.location(),
        error,
        fallback.location()
    );

    let file = format!("{}.md", bundle.title);
    match fallback.write_file(&file, markdown.as_bytes()) {
        Ok(()) => Ok(SaveOutcome::SingleFile {
            location: fallback.location(),
            file,
        }),
        Err(ExportError::PersistenceCancelled) => Ok(SaveOutcome::Cancelled),
        Err(e) => Err(e),
    }
}

fn save_folder<P: Persistence + ?Sized>(
    bundle: &ExportBundle,
    markdown: &str,
    images: &ResolvedImages,
    target: &P,
) -> Result<Vec<String>> {
    let folder = &bundle.title;
    let mut files = Vec::with_capacity(images.len() + 1);

    for image in images.images() {
        let path = format!("{}/{}", folder, image.path);
        target.write_file(&path, &image.bytes)?;
        files.push(path);
    }

    let path = format!("{}/{}.md", folder, folder);
    target.write_file(&path, markdown.as_bytes())?;
    files.push(path);

    Ok(files)
}

use std::path::PathBuf;

use tracing::debug;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickKind {
    Image,
    #[default]
    Any,
}

impl PickKind {
    /// `"image"` selects the image filter; every other hint means any file.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("image") => PickKind::Image,
            _ => PickKind::Any,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PickRequest {
    /// Name of the file the user dragged in, used to pre-fill the dialog.
    pub filename: Option<String>,
    pub kind: PickKind,
}

impl PickRequest {
    pub fn title(&self) -> String {
        match self.filename.as_deref().filter(|f| !f.is_empty()) {
            Some(name) => format!("Select a file (was it {}?)", name),
            None => "Select a file".to_string(),
        }
    }
}

/// Something that can ask the user for one file path.
///
/// Picking is modal and blocks the caller; async code must run it on the
/// blocking pool (the select-file handler uses `spawn_blocking`).
pub trait PathPicker: Send + Sync {
    /// Blocks the calling thread until the user chooses a file or cancels.
    /// Cancelling returns `None`.
    fn pick(&self, request: &PickRequest) -> Option<PathBuf>;
}

/// Desktop dialog backed by `rfd`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdPicker;

impl PathPicker for RfdPicker {
    fn pick(&self, request: &PickRequest) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(request.title());

        if let Some(name) = request.filename.as_deref().filter(|f| !f.is_empty()) {
            dialog = dialog.set_file_name(name);
        }
        if request.kind == PickKind::Image {
            dialog = dialog.add_filter("Image files", &IMAGE_EXTENSIONS);
        }
        dialog = dialog.add_filter("All files", &["*"]);

        debug!(?request, "Opening native file dialog");
        dialog.pick_file()
    }
}

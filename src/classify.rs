use crate::archive;
use crate::config::RecognitionRules;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    ProjectFile,
    SingleProjectArchive,
    MultiProjectArchive,
    InvalidArchive,
    InvalidPath,
}

impl SourceKind {
    pub fn is_archive(self) -> bool {
        matches!(
            self,
            SourceKind::SingleProjectArchive
                | SourceKind::MultiProjectArchive
                | SourceKind::InvalidArchive
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Directory => "Directory",
            SourceKind::ProjectFile => "Project File",
            SourceKind::SingleProjectArchive => "Single-Project Archive",
            SourceKind::MultiProjectArchive => "Multi-Project Archive",
            SourceKind::InvalidArchive => "Invalid Archive",
            SourceKind::InvalidPath => "Invalid Path",
        }
    }
}

pub fn classify(raw_path: &str, rules: &RecognitionRules) -> SourceKind {
    let trimmed = raw_path.trim();
    if trimmed.is_empty() {
        return SourceKind::InvalidPath;
    }

    let path = Path::new(trimmed);
    if path.is_dir() {
        return SourceKind::Directory;
    }
    if !path.is_file() {
        return SourceKind::InvalidPath;
    }
    if rules.is_archive_path(path) {
        return archive::inspect(path, rules);
    }
    if rules.is_marker_file(path) {
        return SourceKind::ProjectFile;
    }
    SourceKind::InvalidPath
}

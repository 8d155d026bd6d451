use crate::classify::SourceKind;
use crate::config::RecognitionRules;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn inspect(path: &Path, rules: &RecognitionRules) -> SourceKind {
    match archive_project_roots(path, rules) {
        Ok(roots) => match roots.len() {
            0 => SourceKind::InvalidArchive,
            1 => SourceKind::SingleProjectArchive,
            _ => SourceKind::MultiProjectArchive,
        },
        Err(err) => {
            debug!(archive = %path.display(), error = %err, "archive inspection failed");
            SourceKind::InvalidArchive
        }
    }
}

pub fn contains_recognized_project(path: &Path, rules: &RecognitionRules) -> Result<bool> {
    Ok(!archive_project_roots(path, rules)?.is_empty())
}

pub fn archive_project_roots(path: &Path, rules: &RecognitionRules) -> Result<Vec<PathBuf>> {
    let names = entry_names(path)?;
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut roots = Vec::new();
    for name in names {
        let entry = Path::new(&name);
        let Some(file_name) = entry.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !rules.is_marker_name(file_name) {
            continue;
        }
        let root = entry
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(PathBuf::new);
        if seen.insert(root.clone()) {
            roots.push(root);
        }
    }
    Ok(roots)
}

fn entry_names(path: &Path) -> Result<Vec<String>> {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("7z") {
        sevenz_entry_names(path)
    } else {
        zip_entry_names(path)
    }
}

fn zip_entry_names(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path).context("open archive")?;
    let archive = zip::ZipArchive::new(file).context("read archive")?;
    Ok(archive.file_names().map(|name| name.to_string()).collect())
}

fn sevenz_entry_names(path: &Path) -> Result<Vec<String>> {
    let reader = sevenz_rust::SevenZReader::open(path, sevenz_rust::Password::empty())
        .map_err(|err| anyhow::anyhow!("read 7z archive: {err}"))?;
    Ok(reader
        .archive()
        .files
        .iter()
        .map(|entry| entry.name().to_string())
        .collect())
}

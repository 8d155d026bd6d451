use crate::archive;
use crate::classify::SourceKind;
use crate::config::RecognitionRules;
use crate::discovery::{self, CancelToken, DiscoveryOutcome};
use crate::planner::{ImportMode, ImportPlan};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("specify a workspace directory, project folder or archive to import")]
    EmptyPath,
    #[error("file or folder not found: {0}")]
    PathNotFound(String),
    #[error("no importable projects found in the selected folder")]
    NoProjectsFound,
    #[error("project scan was cancelled")]
    Cancelled,
    #[error("the selected file is not a recognized project or project archive")]
    NotAProject,
    #[error("extraction into {0} was declined")]
    UserDeclinedOverwrite(String),
    #[error("project name is not specified")]
    EmptyProjectName,
    #[error("project location is not specified")]
    EmptyProjectLocation,
}

impl ValidationError {
    pub fn is_user_abort(&self) -> bool {
        matches!(
            self,
            ValidationError::Cancelled | ValidationError::UserDeclinedOverwrite(_)
        )
    }

    pub fn title(&self) -> &'static str {
        if self.is_user_abort() {
            "Import"
        } else {
            "Error"
        }
    }
}

pub trait ConfirmOverwrite {
    fn confirm_overwrite(&self, dir: &Path) -> bool;
}

pub fn validate(
    plan: &ImportPlan,
    kind: SourceKind,
    discovery: Option<&DiscoveryOutcome>,
    mode: ImportMode,
    rules: &RecognitionRules,
    confirm: &dyn ConfirmOverwrite,
) -> Result<(), ValidationError> {
    let path = plan.source_path.trim();
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    let source = Path::new(path);
    if !source.exists() {
        return Err(ValidationError::PathNotFound(path.to_string()));
    }

    match kind {
        SourceKind::Directory => {
            // A scan that never ran (the caller validated straight away) is
            // performed here, uncancellable, as the commit-time pass.
            let fallback;
            let outcome = match discovery {
                Some(outcome) => outcome,
                None => {
                    fallback = discovery::discover(source, rules, &CancelToken::new());
                    &fallback
                }
            };
            match outcome {
                DiscoveryOutcome::Completed(roots) if !roots.is_empty() => {}
                DiscoveryOutcome::Cancelled => return Err(ValidationError::Cancelled),
                DiscoveryOutcome::Completed(_) => {
                    return Err(ValidationError::NoProjectsFound)
                }
            }
        }
        SourceKind::ProjectFile => {}
        kind if kind.is_archive() => {
            let recognized = archive::contains_recognized_project(source, rules).unwrap_or(false);
            if !recognized {
                return Err(ValidationError::NotAProject);
            }
            let target = match mode {
                ImportMode::CreateNewProject => plan.suggested_location.as_deref(),
                ImportMode::ImportIntoExisting => plan.extraction_path.as_deref(),
            };
            if let Some(target) = target {
                if dir_has_entries(target) && !confirm.confirm_overwrite(target) {
                    return Err(ValidationError::UserDeclinedOverwrite(
                        target.display().to_string(),
                    ));
                }
            }
        }
        _ => return Err(ValidationError::NotAProject),
    }

    if mode == ImportMode::CreateNewProject {
        let name_missing = plan
            .suggested_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty());
        if name_missing {
            return Err(ValidationError::EmptyProjectName);
        }
        let location_missing = plan
            .suggested_location
            .as_deref()
            .map_or(true, |location| location.as_os_str().is_empty());
        if location_missing {
            return Err(ValidationError::EmptyProjectLocation);
        }
    }

    Ok(())
}

fn dir_has_entries(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

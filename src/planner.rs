use crate::classify::SourceKind;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    CreateNewProject,
    ImportIntoExisting,
}

#[derive(Debug, Clone, Default)]
pub struct WizardContext {
    pub project_base_dir: Option<PathBuf>,
    pub project_file_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportPlan {
    pub source_path: String,
    pub project_roots: Vec<PathBuf>,
    pub suggested_name: Option<String>,
    pub suggested_location: Option<PathBuf>,
    pub extraction_path: Option<PathBuf>,
    pub extract_to_subfolder: bool,
}

pub fn extract_to_subfolder_applicable(kind: SourceKind, mode: ImportMode) -> bool {
    kind == SourceKind::SingleProjectArchive && mode == ImportMode::ImportIntoExisting
}

pub fn plan(
    source_path: &str,
    kind: SourceKind,
    roots: &[PathBuf],
    mode: ImportMode,
    context: &WizardContext,
) -> ImportPlan {
    let source = Path::new(source_path);
    let mut plan = ImportPlan {
        source_path: source_path.to_string(),
        project_roots: roots.to_vec(),
        ..ImportPlan::default()
    };

    match (kind, mode) {
        (SourceKind::Directory, ImportMode::CreateNewProject) => {
            // Naming is deferred when the workspace holds more than one project.
            plan.suggested_name = match roots {
                [] => folder_name(source),
                [only] => folder_name(only),
                _ => None,
            };
            plan.suggested_location = Some(source.to_path_buf());
        }
        (SourceKind::ProjectFile, ImportMode::CreateNewProject) => {
            let parent = source.parent().map(Path::to_path_buf);
            plan.suggested_name = parent.as_deref().and_then(folder_name);
            plan.suggested_location = parent;
        }
        (SourceKind::SingleProjectArchive, ImportMode::CreateNewProject) => {
            let stem = archive_stem(source);
            if let Some(stem) = &stem {
                plan.suggested_location = new_project_base(source, context)
                    .map(|dir| dir.join(stem));
            }
            plan.suggested_name = stem;
        }
        (SourceKind::SingleProjectArchive, ImportMode::ImportIntoExisting) => {
            if let Some(base) = &context.project_base_dir {
                plan.extraction_path = Some(match archive_stem(source) {
                    Some(stem) => base.join(stem),
                    None => base.clone(),
                });
                plan.extract_to_subfolder = true;
            }
        }
        (SourceKind::MultiProjectArchive, ImportMode::ImportIntoExisting) => {
            plan.extraction_path = context.project_base_dir.clone();
        }
        _ => {}
    }

    plan
}

fn new_project_base(source: &Path, context: &WizardContext) -> Option<PathBuf> {
    let dir = context
        .project_file_dir
        .clone()
        .or_else(|| source.parent().map(Path::to_path_buf))?;
    if dir.is_file() {
        return dir.parent().map(Path::to_path_buf);
    }
    Some(dir)
}

fn folder_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
}

fn archive_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_base(base: &str) -> WizardContext {
        WizardContext {
            project_base_dir: Some(PathBuf::from(base)),
            project_file_dir: None,
        }
    }

    #[test]
    fn directory_with_one_root_names_after_it() {
        let roots = vec![PathBuf::from("/tmp/ws/app1")];
        let plan = plan(
            "/tmp/ws",
            SourceKind::Directory,
            &roots,
            ImportMode::CreateNewProject,
            &WizardContext::default(),
        );
        assert_eq!(plan.project_roots, roots);
        assert_eq!(plan.suggested_name.as_deref(), Some("app1"));
        assert_eq!(plan.suggested_location, Some(PathBuf::from("/tmp/ws")));
        assert_eq!(plan.extraction_path, None);
    }

    #[test]
    fn directory_with_several_roots_defers_naming() {
        let roots = vec![PathBuf::from("/tmp/ws/app1"), PathBuf::from("/tmp/ws/app2")];
        let plan = plan(
            "/tmp/ws",
            SourceKind::Directory,
            &roots,
            ImportMode::CreateNewProject,
            &WizardContext::default(),
        );
        assert_eq!(plan.project_roots, roots);
        assert_eq!(plan.suggested_name, None);
        assert_eq!(plan.suggested_location, Some(PathBuf::from("/tmp/ws")));
        assert_eq!(plan.extraction_path, None);
    }

    #[test]
    fn directory_without_roots_falls_back_to_its_own_name() {
        let plan = plan(
            "/tmp/workspace",
            SourceKind::Directory,
            &[],
            ImportMode::CreateNewProject,
            &WizardContext::default(),
        );
        assert_eq!(plan.suggested_name.as_deref(), Some("workspace"));
    }

    #[test]
    fn directory_into_existing_suggests_nothing() {
        let roots = vec![PathBuf::from("/tmp/ws/app1")];
        let plan = plan(
            "/tmp/ws",
            SourceKind::Directory,
            &roots,
            ImportMode::ImportIntoExisting,
            &context_with_base("/work"),
        );
        assert_eq!(plan.suggested_name, None);
        assert_eq!(plan.suggested_location, None);
        assert_eq!(plan.extraction_path, None);
    }

    #[test]
    fn single_archive_new_project_derives_from_base_name() {
        let context = WizardContext {
            project_base_dir: None,
            project_file_dir: Some(PathBuf::from("/home/dev/projects")),
        };
        let plan = plan(
            "/tmp/proj.fxp",
            SourceKind::SingleProjectArchive,
            &[],
            ImportMode::CreateNewProject,
            &context,
        );
        assert_eq!(plan.suggested_name.as_deref(), Some("proj"));
        assert_eq!(
            plan.suggested_location,
            Some(PathBuf::from("/home/dev/projects/proj"))
        );
        assert_eq!(plan.extraction_path, None);
    }

    #[test]
    fn single_archive_into_existing_extracts_to_subfolder_of_base() {
        let plan = plan(
            "/tmp/proj.fxp",
            SourceKind::SingleProjectArchive,
            &[],
            ImportMode::ImportIntoExisting,
            &context_with_base("/work"),
        );
        assert_eq!(plan.extraction_path, Some(PathBuf::from("/work/proj")));
        assert!(plan.extract_to_subfolder);
        assert!(extract_to_subfolder_applicable(
            SourceKind::SingleProjectArchive,
            ImportMode::ImportIntoExisting
        ));
    }

    #[test]
    fn multi_archive_into_existing_shares_the_base_directory() {
        let plan = plan(
            "/tmp/bundle.zip",
            SourceKind::MultiProjectArchive,
            &[],
            ImportMode::ImportIntoExisting,
            &context_with_base("/work"),
        );
        assert_eq!(plan.extraction_path, Some(PathBuf::from("/work")));
        assert!(!plan.extract_to_subfolder);
        assert!(!extract_to_subfolder_applicable(
            SourceKind::MultiProjectArchive,
            ImportMode::ImportIntoExisting
        ));
    }

    #[test]
    fn multi_archive_new_project_defers_naming() {
        let plan = plan(
            "/tmp/bundle.zip",
            SourceKind::MultiProjectArchive,
            &[],
            ImportMode::CreateNewProject,
            &WizardContext::default(),
        );
        assert_eq!(plan.suggested_name, None);
        assert_eq!(plan.suggested_location, None);
        assert_eq!(plan.extraction_path, None);
    }

    #[test]
    fn project_file_plans_around_the_marker_parent() {
        let plan = plan(
            "/tmp/ws/app/.project",
            SourceKind::ProjectFile,
            &[PathBuf::from("/tmp/ws/app")],
            ImportMode::CreateNewProject,
            &WizardContext::default(),
        );
        assert_eq!(plan.suggested_name.as_deref(), Some("app"));
        assert_eq!(plan.suggested_location, Some(PathBuf::from("/tmp/ws/app")));
    }

    #[test]
    fn planning_is_deterministic() {
        let roots = vec![PathBuf::from("/tmp/ws/app1")];
        let context = context_with_base("/work");
        let first = plan(
            "/tmp/proj.zip",
            SourceKind::SingleProjectArchive,
            &roots,
            ImportMode::ImportIntoExisting,
            &context,
        );
        let second = plan(
            "/tmp/proj.zip",
            SourceKind::SingleProjectArchive,
            &roots,
            ImportMode::ImportIntoExisting,
            &context,
        );
        assert_eq!(first, second);
    }
}

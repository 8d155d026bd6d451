use crate::classify::{self, SourceKind};
use crate::config::RecognitionRules;
use crate::discovery::{self, CancelToken, DiscoveryMessage, DiscoveryOutcome};
use crate::planner::{self, ImportMode, ImportPlan, WizardContext};
use crate::validator::{self, ConfirmOverwrite, ValidationError};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};

pub struct ResolverSession {
    rules: RecognitionRules,
    mode: ImportMode,
    context: WizardContext,
    generation: u64,
    source_path: String,
    kind: SourceKind,
    discovery: Option<DiscoveryOutcome>,
    plan: ImportPlan,
    scan: Option<ActiveScan>,
}

struct ActiveScan {
    generation: u64,
    cancel: CancelToken,
    rx: Receiver<DiscoveryMessage>,
}

impl ResolverSession {
    pub fn new(rules: RecognitionRules, mode: ImportMode, context: WizardContext) -> Self {
        Self {
            rules,
            mode,
            context,
            generation: 0,
            source_path: String::new(),
            kind: SourceKind::InvalidPath,
            discovery: None,
            plan: ImportPlan::default(),
            scan: None,
        }
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn plan(&self) -> &ImportPlan {
        &self.plan
    }

    pub fn discovery(&self) -> Option<&DiscoveryOutcome> {
        self.discovery.as_ref()
    }

    pub fn scan_in_progress(&self) -> bool {
        self.scan.is_some()
    }

    pub fn set_source_path(&mut self, raw: &str) {
        self.cancel_scan();
        self.generation += 1;
        self.source_path = raw.trim().to_string();
        self.kind = classify::classify(&self.source_path, &self.rules);
        self.discovery = None;

        match self.kind {
            SourceKind::Directory => {
                let cancel = CancelToken::new();
                let rx = discovery::spawn_discovery(
                    PathBuf::from(&self.source_path),
                    self.rules.clone(),
                    cancel.clone(),
                );
                self.scan = Some(ActiveScan {
                    generation: self.generation,
                    cancel,
                    rx,
                });
            }
            SourceKind::ProjectFile => {
                let roots = Path::new(&self.source_path)
                    .parent()
                    .map(|parent| vec![parent.to_path_buf()])
                    .unwrap_or_default();
                self.discovery = Some(DiscoveryOutcome::Completed(roots));
            }
            _ => {}
        }

        self.rebuild_plan();
    }

    pub fn cancel_scan(&mut self) {
        if let Some(scan) = self.scan.take() {
            scan.cancel.cancel();
            if self.kind == SourceKind::Directory {
                self.discovery = Some(DiscoveryOutcome::Cancelled);
            }
        }
    }

    pub fn pump(&mut self) {
        let Some(scan) = &mut self.scan else {
            return;
        };
        loop {
            match scan.rx.try_recv() {
                Ok(DiscoveryMessage::Progress { .. }) => continue,
                Ok(message) => {
                    let generation = scan.generation;
                    self.scan = None;
                    self.apply_scan_result(generation, message);
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.scan = None;
                    return;
                }
            }
        }
    }

    pub fn wait_for_scan(&mut self) {
        while let Some(scan) = &mut self.scan {
            match scan.rx.recv() {
                Ok(DiscoveryMessage::Progress { .. }) => continue,
                Ok(message) => {
                    let generation = scan.generation;
                    self.scan = None;
                    self.apply_scan_result(generation, message);
                }
                Err(_) => {
                    self.scan = None;
                }
            }
        }
    }

    pub fn set_suggested_name(&mut self, name: &str) {
        self.plan.suggested_name = Some(name.trim().to_string());
    }

    pub fn set_suggested_location(&mut self, location: PathBuf) {
        self.plan.suggested_location = Some(location);
    }

    pub fn set_extraction_path(&mut self, path: PathBuf) {
        self.plan.extraction_path = Some(path);
    }

    pub fn set_extract_to_subfolder(&mut self, enabled: bool) {
        if !planner::extract_to_subfolder_applicable(self.kind, self.mode) {
            return;
        }
        self.plan.extract_to_subfolder = enabled;
        if let Some(base) = &self.context.project_base_dir {
            let source = Path::new(&self.source_path);
            let stem = source.file_stem().and_then(|stem| stem.to_str());
            self.plan.extraction_path = Some(match (enabled, stem) {
                (true, Some(stem)) => base.join(stem),
                _ => base.clone(),
            });
        }
    }

    pub fn validate(&self, confirm: &dyn ConfirmOverwrite) -> Result<(), ValidationError> {
        if self.scan_in_progress() {
            return Err(ValidationError::Cancelled);
        }
        validator::validate(
            &self.plan,
            self.kind,
            self.discovery.as_ref(),
            self.mode,
            &self.rules,
            confirm,
        )
    }

    fn apply_scan_result(&mut self, generation: u64, message: DiscoveryMessage) {
        if generation != self.generation {
            return;
        }
        match message {
            DiscoveryMessage::Completed { roots } => {
                self.discovery = Some(DiscoveryOutcome::Completed(roots));
            }
            DiscoveryMessage::Cancelled => {
                self.discovery = Some(DiscoveryOutcome::Cancelled);
            }
            DiscoveryMessage::Progress { .. } => return,
        }
        self.rebuild_plan();
    }

    fn rebuild_plan(&mut self) {
        let roots = match &self.discovery {
            Some(DiscoveryOutcome::Completed(roots)) => roots.clone(),
            _ => Vec::new(),
        };
        self.plan = planner::plan(
            &self.source_path,
            self.kind,
            &roots,
            self.mode,
            &self.context,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::write_zip;
    use std::fs;
    use tempfile::TempDir;

    struct Always(bool);

    impl ConfirmOverwrite for Always {
        fn confirm_overwrite(&self, _dir: &Path) -> bool {
            self.0
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn directory_source_resolves_through_background_scan() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("app1/.project"));
        touch(&dir.path().join("app2/.project"));

        let mut session = ResolverSession::new(
            RecognitionRules::default(),
            ImportMode::ImportIntoExisting,
            WizardContext::default(),
        );
        session.set_source_path(&dir.path().to_string_lossy());
        assert_eq!(session.kind(), SourceKind::Directory);
        while session.scan_in_progress() {
            session.pump();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(session.plan().project_roots.len(), 2);
        session.validate(&Always(true)).unwrap();
    }

    #[test]
    fn plan_is_replaced_wholesale_on_path_change() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("ws/app/.project"));
        let archive_path = dir.path().join("proj.fxp");
        write_zip(&archive_path, &["proj/.project"]);

        let mut session = ResolverSession::new(
            RecognitionRules::default(),
            ImportMode::ImportIntoExisting,
            WizardContext {
                project_base_dir: Some(dir.path().join("work")),
                project_file_dir: None,
            },
        );

        session.set_source_path(&dir.path().join("ws").to_string_lossy());
        session.wait_for_scan();
        assert_eq!(session.kind(), SourceKind::Directory);
        assert_eq!(session.plan().project_roots.len(), 1);

        session.set_source_path(&archive_path.to_string_lossy());
        assert_eq!(session.kind(), SourceKind::SingleProjectArchive);
        assert!(session.plan().project_roots.is_empty());
        assert_eq!(
            session.plan().extraction_path,
            Some(dir.path().join("work/proj"))
        );
        session.validate(&Always(true)).unwrap();
    }

    #[test]
    fn stale_scan_results_are_dropped_after_a_path_change() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("old/app/.project"));
        touch(&dir.path().join("new/other/.project"));

        let mut session = ResolverSession::new(
            RecognitionRules::default(),
            ImportMode::ImportIntoExisting,
            WizardContext::default(),
        );
        session.set_source_path(&dir.path().join("old").to_string_lossy());
        session.set_source_path(&dir.path().join("new").to_string_lossy());
        session.wait_for_scan();

        let Some(DiscoveryOutcome::Completed(roots)) = session.discovery() else {
            panic!("scan did not complete");
        };
        assert_eq!(roots, &vec![dir.path().join("new/other")]);
    }

    #[test]
    fn cancelling_keeps_the_session_editable() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("app/.project"));

        let mut session = ResolverSession::new(
            RecognitionRules::default(),
            ImportMode::ImportIntoExisting,
            WizardContext::default(),
        );
        session.set_source_path(&dir.path().to_string_lossy());
        session.cancel_scan();

        let err = session.validate(&Always(true)).unwrap_err();
        assert!(err.is_user_abort());

        session.set_source_path(&dir.path().to_string_lossy());
        session.wait_for_scan();
        session.validate(&Always(true)).unwrap();
    }

    #[test]
    fn subfolder_toggle_rederives_the_extraction_path() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("proj.fxp");
        write_zip(&archive_path, &["proj/.project"]);
        let base = dir.path().join("work");

        let mut session = ResolverSession::new(
            RecognitionRules::default(),
            ImportMode::ImportIntoExisting,
            WizardContext {
                project_base_dir: Some(base.clone()),
                project_file_dir: None,
            },
        );
        session.set_source_path(&archive_path.to_string_lossy());
        assert_eq!(session.plan().extraction_path, Some(base.join("proj")));

        session.set_extract_to_subfolder(false);
        assert_eq!(session.plan().extraction_path, Some(base.clone()));

        session.set_extract_to_subfolder(true);
        assert_eq!(session.plan().extraction_path, Some(base.join("proj")));
    }
}

use crate::config::RecognitionRules;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::debug;
use walkdir::WalkDir;

const SCAN_PROGRESS_STRIDE: usize = 250;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Completed(Vec<PathBuf>),
    Cancelled,
}

pub enum DiscoveryMessage {
    Progress { visited: usize },
    Completed { roots: Vec<PathBuf> },
    Cancelled,
}

pub fn discover(root: &Path, rules: &RecognitionRules, cancel: &CancelToken) -> DiscoveryOutcome {
    scan(root, rules, cancel, None)
}

pub fn spawn_discovery(
    root: PathBuf,
    rules: RecognitionRules,
    cancel: CancelToken,
) -> Receiver<DiscoveryMessage> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let message = match scan(&root, &rules, &cancel, Some(&tx)) {
            DiscoveryOutcome::Completed(roots) => DiscoveryMessage::Completed { roots },
            DiscoveryOutcome::Cancelled => DiscoveryMessage::Cancelled,
        };
        let _ = tx.send(message);
    });
    rx
}

fn scan(
    root: &Path,
    rules: &RecognitionRules,
    cancel: &CancelToken,
    progress: Option<&Sender<DiscoveryMessage>>,
) -> DiscoveryOutcome {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut roots = Vec::new();
    let mut visited = 0usize;

    for entry in WalkDir::new(root).follow_links(false) {
        if cancel.is_cancelled() {
            debug!(root = %root.display(), visited, "project scan cancelled");
            return DiscoveryOutcome::Cancelled;
        }
        visited += 1;
        if visited % SCAN_PROGRESS_STRIDE == 0 {
            if let Some(tx) = progress {
                let _ = tx.send(DiscoveryMessage::Progress { visited });
            }
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !rules.is_marker_name(&name) {
            continue;
        }
        let Some(parent) = entry.path().parent() else {
            continue;
        };
        if seen.insert(parent.to_path_buf()) {
            roots.push(parent.to_path_buf());
        }
    }

    debug!(root = %root.display(), visited, found = roots.len(), "project scan complete");
    DiscoveryOutcome::Completed(roots)
}

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use side_core::actions::HostEvent;
use side_core::config::SearchPreferences;
use side_core::reducer::SideEffect;
use side_core::state::BridgeError;
use side_core::state::BridgeErrorKind;
use side_core::state::SearchResult;
use side_core::tree::DirectoryNode;
use side_exec::contracts::CommandRequest;
use side_exec::contracts::DirEntry;
use side_exec::contracts::SearchHit;
use side_exec::contracts::SearchOptions;
use side_exec::error::HostError;
use side_exec::host::HostRuntime;

/// Runs host requests on worker threads and hands their results back to the
/// UI loop as [`HostEvent`]s. One thread per request; nothing is retried or
/// cancelled.
pub struct HostBridge {
    host: Arc<dyn HostRuntime>,
    tx: mpsc::Sender<HostEvent>,
    rx: mpsc::Receiver<HostEvent>,
    shutdown: Arc<AtomicBool>,
}

impl HostBridge {
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            host,
            tx,
            rx,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queues an event as if the host had pushed it.
    pub fn push(&self, event: HostEvent) {
        let _ = self.tx.send(event);
    }

    /// Starts the host request behind `effect`. Effects the host does not
    /// serve are handed back for the frontend.
    pub fn dispatch(&self, effect: SideEffect) -> Option<SideEffect> {
        match effect {
            SideEffect::ReadFile { path, line, ticket } => {
                self.spawn(move |host| HostEvent::FileRead {
                    result: host.read_file(&path).map_err(bridge_error),
                    path,
                    line,
                    ticket,
                });
            }
            SideEffect::WriteFile {
                path,
                content,
                revision,
            } => {
                self.spawn(move |host| HostEvent::FileWritten {
                    result: host.write_file(&path, &content).map_err(bridge_error),
                    path,
                    revision,
                });
            }
            SideEffect::ListDirectory { path, generation } => {
                self.spawn(move |host| HostEvent::DirectoryListed {
                    result: host
                        .list_directory(&path)
                        .map(|entries| entries.into_iter().map(directory_node).collect())
                        .map_err(bridge_error),
                    path,
                    generation,
                });
            }
            SideEffect::SearchInFiles {
                folder,
                query,
                generation,
                options,
            } => {
                self.spawn(move |host| HostEvent::SearchCompleted {
                    generation,
                    result: host
                        .search_in_files(&folder, &query, &search_options(&options))
                        .map(|hits| hits.into_iter().map(search_result).collect())
                        .map_err(bridge_error),
                });
            }
            SideEffect::RunCommand {
                command,
                cwd,
                shell,
            } => {
                self.spawn(move |host| {
                    let request = CommandRequest {
                        command: command.clone(),
                        cwd,
                        shell,
                    };
                    match host.run_command(&request) {
                        Ok(out) => HostEvent::TerminalOutput {
                            command,
                            output: out.output,
                            is_error: out.is_error,
                        },
                        Err(err) => HostEvent::CommandFailed {
                            command,
                            error: bridge_error(err),
                        },
                    }
                });
            }
            other => return Some(other),
        }
        None
    }

    /// Reads `path` for the open-file prompt.
    pub fn open_file(&self, path: PathBuf) {
        self.spawn(move |host| match host.read_file(&path) {
            Ok(content) => HostEvent::FileOpened { path, content },
            Err(err) => HostEvent::FileOpenFailed {
                path,
                error: bridge_error(err),
            },
        });
    }

    pub fn try_recv(&self) -> Option<HostEvent> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<HostEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Stops delivery. Workers still running finish, but their results are
    /// dropped.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        while self.rx.try_recv().is_ok() {}
    }

    fn spawn<F>(&self, work: F)
    where
        F: FnOnce(&dyn HostRuntime) -> HostEvent + Send + 'static,
    {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }
        let host = Arc::clone(&self.host);
        let tx = self.tx.clone();
        let shutdown = Arc::clone(&self.shutdown);
        std::thread::spawn(move || {
            let event = work(host.as_ref());
            if shutdown.load(Ordering::SeqCst) {
                tracing::debug!("dropping host result after shutdown");
                return;
            }
            let _ = tx.send(event);
        });
    }
}

fn bridge_error(err: HostError) -> BridgeError {
    let kind = match &err {
        HostError::FileRead { .. } => BridgeErrorKind::FileRead,
        HostError::FileWrite { .. } => BridgeErrorKind::FileWrite,
        HostError::DirectoryList { .. } => BridgeErrorKind::DirectoryList,
        HostError::Search { .. } => BridgeErrorKind::Search,
        HostError::CommandExecution { .. } => BridgeErrorKind::CommandExecution,
    };
    tracing::warn!(error = %err, "host request failed");
    BridgeError::new(kind, err.detail())
}

fn directory_node(entry: DirEntry) -> DirectoryNode {
    if entry.is_directory {
        DirectoryNode::directory(entry.name, entry.path)
    } else {
        DirectoryNode::file(entry.name, entry.path)
    }
}

fn search_result(hit: SearchHit) -> SearchResult {
    SearchResult {
        file_path: hit.file_path,
        line_number: hit.line_number,
        match_text: hit.match_text,
    }
}

fn search_options(prefs: &SearchPreferences) -> SearchOptions {
    SearchOptions {
        case_sensitive: prefs.case_sensitive,
        max_results: prefs.max_results,
        include_hidden: prefs.include_hidden,
    }
}

//! Console application state and command dispatch.

use anyhow::Result;
use cortex_core::document::{DocumentState, FitMode, PdfBlobLoader, ViewerState};
use cortex_core::models::{IngestScope, Role, SyncDirection};
use cortex_core::plugins::builtin::{
    CalculatorPlugin, DrivePickerPlugin, ImageViewerPlugin, MockDriveSource, NotesPlugin,
};
use cortex_core::plugins::{slots, PluginEvent, PluginHost};
use cortex_core::{
    FileExplorer, HttpBackend, HttpClient, NullBackend, OrchestratorBackend,
    SessionSyncController,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct ConsoleApp {
    sessions: Arc<SessionSyncController>,
    explorer: FileExplorer,
    loader: PdfBlobLoader,
    viewer: Mutex<ViewerState>,
    host: PluginHost,
    /// Drained after widget activations so bus-emitted toggles reach the
    /// widgets synchronously.
    bus_rx: Mutex<tokio::sync::broadcast::Receiver<PluginEvent>>,
    calculator: CalculatorPlugin,
    notes: NotesPlugin,
    images: ImageViewerPlugin,
}

impl ConsoleApp {
    pub fn new(api_url: &str, data_dir: &Path, offline: bool) -> Result<Self> {
        let backend: Arc<dyn OrchestratorBackend> = if offline {
            Arc::new(NullBackend::new())
        } else {
            Arc::new(HttpBackend::new(api_url)?)
        };

        let sessions = Arc::new(SessionSyncController::new(backend.clone()));
        let explorer = FileExplorer::new(backend);
        let loader = PdfBlobLoader::new(Arc::new(HttpClient::new(api_url)?));

        let host = PluginHost::new();
        let calculator = CalculatorPlugin::new();
        let notes = NotesPlugin::new(data_dir);
        let images = ImageViewerPlugin::new();
        host.register(&calculator);
        host.register(&notes);
        host.register(&images);
        host.register(&DrivePickerPlugin::new(Arc::new(MockDriveSource)));
        let bus_rx = Mutex::new(host.bus().subscribe());

        Ok(Self {
            sessions,
            explorer,
            loader,
            viewer: Mutex::new(ViewerState::new()),
            host,
            bus_rx,
            calculator,
            notes,
            images,
        })
    }

    pub fn start(&self) {
        self.sessions.start_polling();
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            match sessions.health().await {
                Ok(()) => {
                    if let Err(e) = sessions.system_status().await {
                        debug!("System status check failed: {}", e);
                    }
                }
                Err(e) => debug!("Health check failed: {}", e),
            }
        });
    }

    pub fn shutdown(&self) {
        self.sessions.stop_polling();
    }

    /// Handle one input line; returns `false` to exit.
    pub async fn handle_line(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        if !line.starts_with('/') {
            self.send(line).await;
            return true;
        }

        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or("").trim();

        match command {
            "/quit" | "/exit" => return false,
            "/help" => self.print_help(),
            "/new" => {
                self.sessions.new_chat().await;
                self.host.deliver(&PluginEvent::SessionChanged { session_id: None });
                println!("Started a new chat.");
            }
            "/sessions" => self.print_sessions().await,
            "/open" => {
                if rest.is_empty() {
                    println!("Usage: /open <session-id>");
                } else {
                    self.sessions.select_session(rest).await;
                    self.host.deliver(&PluginEvent::SessionChanged {
                        session_id: Some(rest.to_string()),
                    });
                    self.print_transcript();
                }
            }
            "/clone" => match self.sessions.clone_session(rest).await {
                Ok(new_id) => println!("Cloned into {}", new_id),
                Err(e) => println!("Clone failed: {}", e),
            },
            "/delete" => match self.sessions.delete_session(rest).await {
                Ok(()) => println!("Deleted {}", rest),
                Err(e) => println!("Delete failed: {}", e),
            },
            "/tasks" => self.print_tasks(),
            "/repos" => self.print_repos(),
            "/refresh" => {
                if let Err(e) = self.sessions.sync_session_data().await {
                    println!("Refresh failed: {}", e);
                }
                self.print_tasks();
                self.print_repos();
            }
            "/ingest" => {
                let (url, scope) = split_scope(rest);
                self.sessions.ingest_repo(url, scope).await;
                self.print_new_system_messages();
            }
            "/pdf" => {
                let (url, scope) = split_scope(rest);
                let stored = self.sessions.ingest_pdf(url, scope, None, None, false).await;
                self.print_new_system_messages();
                if let Some(stored_url) = stored {
                    self.open_document(&stored_url).await;
                }
            }
            "/repo" => match self.explorer.expand(rest).await {
                Ok(()) => {
                    // The expanded repository rides along as query context.
                    let repo = self.explorer.expanded_repo();
                    self.sessions.update_settings(|s| s.repo_context = repo);
                    self.print_files();
                }
                Err(e) => println!("Failed to open repository: {}", e),
            },
            "/ls" => match self.explorer.open_dir(rest).await {
                Ok(()) => self.print_files(),
                Err(e) => println!("Listing failed: {}", e),
            },
            "/cat" => match self.explorer.open_file(rest).await {
                Ok(()) => {
                    if let Some(open) = self.explorer.snapshot().open_file {
                        println!("--- {} ---", open.path);
                        println!("{}", open.content);
                    }
                }
                Err(e) => println!("Failed to read file: {}", e),
            },
            "/edit" => {
                let mut args = rest.splitn(2, ' ');
                let path = args.next().unwrap_or("");
                let content = args.next().unwrap_or("");
                match self.edit_file(path, content).await {
                    Ok(()) => println!("Saved {}", path),
                    Err(e) => println!("Save failed: {}", e),
                }
            }
            "/doc" => {
                if rest.is_empty() || rest == "none" {
                    let _ = self.loader.load(None).await;
                    println!("Viewer cleared.");
                } else {
                    self.open_document(rest).await;
                }
            }
            "/page" => self.page_command(rest),
            "/zoom" => self.zoom_command(rest),
            "/fit" => self.fit_command(rest),
            "/model" => {
                if rest.is_empty() {
                    println!("Model: {}", self.sessions.settings().model);
                } else {
                    self.sessions
                        .update_settings(|s| s.model = rest.to_string());
                    println!("Model set to {}", rest);
                }
            }
            "/provider" => {
                if rest.is_empty() {
                    println!("Provider: {}", self.sessions.settings().provider);
                } else {
                    self.sessions
                        .update_settings(|s| s.provider = rest.to_string());
                    println!("Provider set to {}", rest);
                }
            }
            "/rag" => {
                let mode = if rest.is_empty() || rest == "off" {
                    None
                } else {
                    Some(rest.to_string())
                };
                self.sessions.update_settings(|s| s.rag_mode = mode);
                println!(
                    "RAG mode: {}",
                    self.sessions.settings().rag_mode.as_deref().unwrap_or("default")
                );
            }
            "/status" => match self.sessions.system_status().await {
                Ok(status) => println!("Backend mode: {}", status.mode),
                Err(e) => println!("Status check failed: {}", e),
            },
            "/mode" => match self.sessions.switch_mode().await {
                Ok(mode) => println!("Switched to {}. Restart the backend to apply.", mode),
                Err(e) => println!("Mode switch failed: {}", e),
            },
            "/sync" => {
                let direction = match rest {
                    "push" => SyncDirection::Push,
                    "pull" => SyncDirection::Pull,
                    _ => {
                        println!("Usage: /sync <push|pull>");
                        return true;
                    }
                };
                match self.sessions.trigger_sync(direction).await {
                    Ok(()) => println!("Sync started in background."),
                    Err(e) => println!("Sync failed: {}", e),
                }
            }
            "/backup" => match self.sessions.trigger_backup().await {
                Ok(Some(path)) => println!("Backup saved to: {}", path),
                Ok(None) => println!("Backup finished."),
                Err(e) => println!("Backup failed: {}", e),
            },
            "/plugins" => {
                for manifest in self.host.registry().plugins() {
                    println!(
                        "{} v{} - {}",
                        manifest.name,
                        manifest.version,
                        manifest.description.as_deref().unwrap_or("")
                    );
                }
            }
            "/sidebar" => {
                for (index, widget) in self
                    .host
                    .render_slot(slots::SIDEBAR_ITEM, &serde_json::Value::Null)
                    .iter()
                    .enumerate()
                {
                    println!("{}: {}", index, widget.lines.join(" "));
                }
            }
            "/toggle" => self.toggle_command(rest),
            "/overlay" => self.print_overlay(),
            "/calc" => {
                for key in rest.chars().filter(|c| !c.is_whitespace()) {
                    self.calculator.press(&key.to_string());
                }
                println!("= {}", self.calculator.display());
            }
            "/note" => {
                self.notes.set_draft(rest);
                match self.notes.save() {
                    Ok(()) => println!("Note saved."),
                    Err(e) => println!("Note save failed: {}", e),
                }
            }
            "/images" => {
                self.images.next();
                if let Some(url) = self.images.current() {
                    println!("Showing {}", url);
                } else {
                    println!("No images loaded.");
                }
            }
            other => println!("Unknown command {} (try /help)", other),
        }
        true
    }

    async fn send(&self, text: &str) {
        let before = self.sessions.snapshot().messages.len();
        self.sessions.send_message(text).await;
        let state = self.sessions.snapshot();
        for message in state.messages.iter().skip(before) {
            print_message(message);
        }
    }

    async fn open_document(&self, url: &str) {
        match self.loader.load(Some(url)).await {
            Ok(()) => {}
            Err(e) => {
                debug!("Superseded document load: {}", e);
                return;
            }
        }
        self.loader.with_state(|state| match state {
            DocumentState::Ready { url, handle } => {
                let num_pages = estimate_page_count(handle.data());
                self.viewer
                    .lock()
                    .expect("viewer lock poisoned")
                    .set_num_pages(num_pages);
                println!(
                    "Loaded {} ({} KiB, ~{} pages) as {}",
                    url,
                    handle.len() / 1024,
                    num_pages,
                    handle.url()
                );
            }
            DocumentState::FetchError { url, message } => {
                println!("Could not download the document: {}", message);
                println!("Open it externally instead: {}", url);
            }
            DocumentState::ParseError { url, message } => {
                println!("Downloaded, but not a readable PDF: {}", message);
                println!("Open it externally instead: {}", url);
            }
            _ => {}
        });
        if self.loader.is_ready() {
            self.host.deliver(&PluginEvent::DocumentOpened {
                url: url.to_string(),
            });
        }
    }

    async fn edit_file(&self, path: &str, content: &str) -> cortex_core::Result<()> {
        self.explorer.open_file(path).await?;
        self.explorer.save_open_file(content).await
    }

    fn page_command(&self, arg: &str) {
        let mut viewer = self.viewer.lock().expect("viewer lock poisoned");
        match arg {
            "next" => viewer.next_page(),
            "prev" => viewer.previous_page(),
            _ => match arg.parse::<u32>() {
                Ok(page) => viewer.set_page(page),
                Err(_) => {
                    println!("Usage: /page <n|next|prev>");
                    return;
                }
            },
        }
        println!("Page {} / {}", viewer.page(), viewer.num_pages().max(1));
    }

    fn zoom_command(&self, arg: &str) {
        let mut viewer = self.viewer.lock().expect("viewer lock poisoned");
        match arg {
            "in" => viewer.zoom_in(),
            "out" => viewer.zoom_out(),
            _ => {
                println!("Usage: /zoom <in|out>");
                return;
            }
        }
        println!("Zoom {:.0}%", viewer.zoom() * 100.0);
    }

    fn fit_command(&self, arg: &str) {
        let mode = match arg {
            "width" => FitMode::FitWidth,
            "height" => FitMode::FitHeight,
            "manual" => FitMode::Manual,
            _ => {
                println!("Usage: /fit <width|height|manual>");
                return;
            }
        };
        self.viewer
            .lock()
            .expect("viewer lock poisoned")
            .set_fit(mode);
        println!("Fit mode set to {}.", arg);
    }

    fn toggle_command(&self, arg: &str) {
        let entries = self.host.registry().slots(slots::SIDEBAR_ITEM);
        match arg.parse::<usize>().ok().and_then(|i| entries.get(i)) {
            Some(entry) => {
                entry.widget.activate();
                self.drain_bus();
                self.print_overlay();
            }
            None => println!("Usage: /toggle <index> (see /sidebar)"),
        }
    }

    /// Forward bus-emitted events (trigger activations) to the widgets.
    fn drain_bus(&self) {
        let mut rx = self.bus_rx.lock().expect("bus receiver lock poisoned");
        while let Ok(event) = rx.try_recv() {
            self.host.deliver(&event);
        }
    }

    fn print_overlay(&self) {
        let widgets = self.host.render_overlay();
        if widgets.is_empty() {
            println!("(overlay empty)");
            return;
        }
        for widget in widgets {
            println!("== {} ==", widget.title);
            for line in widget.lines {
                println!("  {}", line);
            }
        }
    }

    fn print_help(&self) {
        println!("Chat: type a message and press enter");
        println!("Sessions: /new /sessions /open <id> /clone <id> /delete <id>");
        println!("Roadmap & knowledge: /tasks /repos /refresh /ingest <url> [session] /pdf <url> [session]");
        println!("Repository: /repo <name> /ls <path> /cat <path> /edit <path> <content>");
        println!("Viewer: /doc <url|none> /page <n|next|prev> /zoom <in|out> /fit <width|height|manual>");
        println!("Settings: /model [name] /provider [name] /rag [mode|off]");
        println!("System: /status /mode /sync <push|pull> /backup");
        println!("Widgets: /plugins /sidebar /toggle <i> /overlay /calc <keys> /note <text> /images");
        println!("/quit to exit");
    }

    async fn print_sessions(&self) {
        if let Err(e) = self.sessions.refresh_sessions().await {
            println!("Could not refresh the session list: {}", e);
        }
        let state = self.sessions.snapshot();
        if state.sessions.is_empty() {
            println!("No sessions yet.");
            return;
        }
        for session in &state.sessions {
            let marker = if state.current_session_id.as_deref() == Some(session.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "{} {}  {}",
                marker,
                session.id,
                session.title.as_deref().unwrap_or("(untitled)")
            );
        }
    }

    fn print_transcript(&self) {
        for message in &self.sessions.snapshot().messages {
            print_message(message);
        }
    }

    fn print_new_system_messages(&self) {
        let state = self.sessions.snapshot();
        for message in state.messages.iter().rev().take(2).rev() {
            if message.role == Role::System {
                print_message(message);
            }
        }
    }

    fn print_tasks(&self) {
        let state = self.sessions.snapshot();
        if state.tasks.is_empty() {
            println!("Roadmap empty.");
            return;
        }
        for task in &state.tasks {
            println!(
                "[{:?}] {} ({})",
                task.status, task.title, task.assigned_agent
            );
        }
    }

    fn print_repos(&self) {
        let state = self.sessions.snapshot();
        if state.repos.is_empty() {
            println!("No knowledge sources.");
            return;
        }
        for repo in &state.repos {
            println!("{} [{}]", repo.name, repo.status);
        }
    }

    fn print_files(&self) {
        let state = self.explorer.snapshot();
        if state.files.is_empty() {
            println!("(empty directory)");
            return;
        }
        for file in &state.files {
            let marker = if file.is_dir() { "/" } else { "" };
            println!("{}{}", file.name, marker);
        }
    }
}

fn print_message(message: &cortex_core::Message) {
    let prefix = match message.role {
        Role::User => "you",
        Role::Assistant => "cortex",
        Role::System => "system",
    };
    println!("{:>7} | {}", prefix, message.content);
    if let Some(model) = &message.model {
        println!("{:>7} | ({})", "", model);
    }
}

fn split_scope(rest: &str) -> (&str, IngestScope) {
    match rest.strip_suffix(" session") {
        Some(url) => (url.trim(), IngestScope::Session),
        None => (rest, IngestScope::Global),
    }
}

/// Rough page count from the raw PDF: `/Type /Page` objects, excluding the
/// `/Pages` tree nodes. Only used for the console's page indicator; real
/// rendering would report the exact count.
fn estimate_page_count(data: &[u8]) -> u32 {
    const NEEDLE: &[u8] = b"/Type /Page";
    let mut count = 0u32;
    let mut index = 0usize;
    while index + NEEDLE.len() <= data.len() {
        if &data[index..index + NEEDLE.len()] == NEEDLE {
            let after = data.get(index + NEEDLE.len());
            if after != Some(&b's') {
                count += 1;
            }
            index += NEEDLE.len();
        } else {
            index += 1;
        }
    }
    count.max(1)
}

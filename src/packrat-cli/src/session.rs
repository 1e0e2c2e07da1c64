//! Interactive session shell.
//!
//! A line-oriented stand-in for the graphical shell: selection-changing
//! commands record history captures, back/forward navigate them, and a
//! timer on the same select! loop polls for staleness every 2.5 s. One
//! logical owner drives everything, so engine state is never shared
//! across threads.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use packrat_common::{detect_project_root, display_path, is_text_file};
use packrat_history::{
    CaptureRequest, HistoryEngine, NavOutcome, SelectionMode, StaleReport, STALE_CHECK_INTERVAL,
};
use packrat_render::{render_markdown, render_tree, RenderOptions};

use crate::args::Cli;
use crate::config::PackratConfig;

enum Action {
    Continue,
    Quit,
    /// The poll timer must be restarted (after storage relocation).
    ResetPoll,
}

struct Session {
    engine: HistoryEngine,
    config: PackratConfig,
    files: Vec<PathBuf>,
    selected_items: Vec<String>,
    selection_mode: SelectionMode,
    selected_file: Option<PathBuf>,
    last_report: StaleReport,
}

pub async fn run(cli: Cli, config: PackratConfig) -> Result<()> {
    let mut engine = HistoryEngine::new(is_text_file);
    if cli.no_history {
        println!("Session history disabled (--no-history).");
    } else {
        let base = cli.history_dir.clone().or_else(|| config.history_dir.clone());
        if let Err(e) = engine.init_storage(base.as_deref()).await {
            eprintln!("warning: history disabled: {e}");
        }
    }

    let mut session = Session {
        engine,
        config,
        files: Vec::new(),
        selected_items: Vec::new(),
        selection_mode: SelectionMode::AllFiles,
        selected_file: None,
        last_report: StaleReport::default(),
    };

    for file in &cli.files {
        session.add_file(file);
    }
    if !session.files.is_empty() {
        session.capture().await;
    }

    println!("packrat interactive session. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = new_poll_timer();

    loop {
        prompt();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match session.handle(line.trim()).await {
                    Action::Continue => {}
                    Action::Quit => break,
                    // Relocation already ran with the timer quiescent (we
                    // were in the command branch); give it a fresh phase.
                    Action::ResetPoll => poll = new_poll_timer(),
                }
            }
            _ = poll.tick() => session.poll().await,
        }
    }

    session.engine.shutdown().await;
    Ok(())
}

fn new_poll_timer() -> time::Interval {
    let mut poll = time::interval_at(
        Instant::now() + STALE_CHECK_INTERVAL,
        STALE_CHECK_INTERVAL,
    );
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll
}

fn prompt() {
    print!("packrat> ");
    let _ = std::io::stdout().flush();
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Session {
    fn add_file(&mut self, path: &Path) {
        let path = absolutize(path);
        if !path.is_file() {
            eprintln!("warning: not a file, skipping: {}", path.display());
            return;
        }
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    fn request(&self) -> CaptureRequest {
        CaptureRequest {
            files: self.files.clone(),
            selected_items: self.selected_items.clone(),
            selection_mode: self.selection_mode,
            selected_file: self.selected_file.clone(),
        }
    }

    async fn capture(&mut self) {
        let request = self.request();
        if let Err(e) = self.engine.capture(request).await {
            eprintln!("warning: could not record history state: {e}");
        }
    }

    async fn handle(&mut self, line: &str) -> Action {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Action::Continue;
        };

        match command {
            "help" => print_help(),
            "add" => {
                if args.is_empty() {
                    eprintln!("usage: add <file>...");
                } else {
                    for arg in args {
                        self.add_file(Path::new(arg));
                    }
                    self.capture().await;
                }
            }
            "rm" => {
                if let [arg] = args {
                    let path = absolutize(Path::new(arg));
                    self.files.retain(|f| f != &path);
                    if self.selected_file.as_deref() == Some(path.as_path()) {
                        self.selected_file = None;
                        self.selection_mode = SelectionMode::AllFiles;
                    }
                    self.capture().await;
                } else {
                    eprintln!("usage: rm <file>");
                }
            }
            "select" => {
                if let [arg] = args {
                    let path = absolutize(Path::new(arg));
                    if self.files.contains(&path) {
                        self.selection_mode = SelectionMode::SingleFile;
                        self.selected_file = Some(path);
                        self.capture().await;
                    } else {
                        eprintln!("not in the working set: {}", path.display());
                    }
                } else {
                    eprintln!("usage: select <file>");
                }
            }
            "all" => {
                self.selection_mode = SelectionMode::AllFiles;
                self.selected_file = None;
                self.capture().await;
            }
            "symbols" => {
                self.selected_items = args.iter().map(|s| s.to_string()).collect();
                self.capture().await;
            }
            "back" => match self.engine.back().await {
                Ok(Some(outcome)) => self.apply(outcome),
                Ok(None) => println!("Already at the oldest state."),
                Err(e) => eprintln!("warning: {e}"),
            },
            "forward" => match self.engine.forward().await {
                Ok(Some(outcome)) => self.apply(outcome),
                Ok(None) => println!("No forward history."),
                Err(e) => eprintln!("warning: {e}"),
            },
            "status" => self.print_status(),
            "render" => self.render(),
            "relocate" => {
                if let [arg] = args {
                    return self.relocate(Path::new(arg)).await;
                }
                eprintln!("usage: relocate <dir>");
            }
            "quit" | "exit" => return Action::Quit,
            other => eprintln!("unknown command: {other} (try 'help')"),
        }
        Action::Continue
    }

    /// Apply a loaded state back to the selection model. The guard keeps
    /// the capture path quiet for the duration.
    fn apply(&mut self, outcome: NavOutcome) {
        {
            let _guard = self.engine.apply_guard();
            self.files = outcome.state.files.clone();
            self.selected_items = outcome.state.selected_items.clone();
            self.selection_mode = outcome.state.selection_mode;
            self.selected_file = outcome.state.selected_file.clone();
        }

        println!(
            "Restored state {} (captured {})",
            self.engine.position().label(),
            outcome.state.timestamp.to_rfc3339()
        );
        self.print_report(&outcome.stale);
        self.last_report = outcome.stale;
    }

    async fn poll(&mut self) {
        let report = self.engine.poll_staleness().await;
        if report != self.last_report {
            self.print_report(&report);
            self.last_report = report;
        }
    }

    fn print_report(&self, report: &StaleReport) {
        if report.is_empty() {
            if !self.last_report.is_empty() {
                println!("All tracked files are current again.");
            }
            return;
        }
        let root = detect_project_root(&self.files);
        println!("Snapshot is stale ({} file(s)):", report.len());
        for (path, status) in report.iter() {
            println!("  {status:<8} {}", display_path(path, root.as_deref(), true));
        }
    }

    fn print_status(&self) {
        let root = detect_project_root(&self.files);
        println!("Working set ({} file(s)):", self.files.len());
        for file in &self.files {
            let marker = if self.selected_file.as_deref() == Some(file.as_path()) {
                "*"
            } else {
                " "
            };
            println!("  {marker} {}", display_path(file, root.as_deref(), true));
        }
        if !self.selected_items.is_empty() {
            println!("Symbols: {}", self.selected_items.join(", "));
        }
        match self.engine.history_dir() {
            Some(dir) => println!(
                "History: {} (stored in {})",
                self.engine.position().label(),
                dir.display()
            ),
            None => println!("History: disabled"),
        }
        match self.last_report.severity() {
            Some(severity) => println!("Staleness: {severity}"),
            None => println!("Staleness: current"),
        }
    }

    fn render(&self) {
        let files: Vec<PathBuf> = match (self.selection_mode, &self.selected_file) {
            (SelectionMode::SingleFile, Some(file)) => vec![file.clone()],
            _ => self.files.clone(),
        };
        let root = detect_project_root(&files);

        let mut output = String::new();
        if self.config.tree_enabled {
            if let Some(base) = &root {
                match render_tree(
                    base,
                    self.config.tree_ignore(),
                    self.config.tree_max_depth,
                    root.as_deref(),
                ) {
                    Ok(block) => {
                        output.push_str(&block);
                        output.push('\n');
                    }
                    Err(e) => eprintln!("warning: could not render tree: {e}"),
                }
            }
        }

        let options = RenderOptions {
            project_root: root,
            selected_items: self.selected_items.clone(),
            symbol_extractor: None,
        };
        output.push_str(&render_markdown(&files, &options));
        println!("{output}");
    }

    async fn relocate(&mut self, new_base: &Path) -> Action {
        debug!(new_base = %new_base.display(), "Relocating history storage");
        match self.engine.relocate(Some(&absolutize(new_base))).await {
            Ok(()) => {
                if let Some(dir) = self.engine.history_dir() {
                    println!(
                        "History location updated and existing history cleared.\n\
                         New history will be stored in: {}",
                        dir.display()
                    );
                }
                self.last_report = StaleReport::default();
                // Re-seed history with the live selection.
                if !self.files.is_empty() {
                    self.capture().await;
                }
            }
            Err(e) => eprintln!("warning: history location could not be set, history disabled: {e}"),
        }
        Action::ResetPoll
    }
}

fn print_help() {
    println!(
        "\
Commands:
  add <file>...     add files to the working set
  rm <file>         remove a file
  select <file>     narrow output to a single file
  all               output all files
  symbols [name]... narrow output to named symbols (no names clears)
  back              go to the previous selection state
  forward           go to the next selection state
  status            show working set, history position, staleness
  render            print the Markdown artifact
  relocate <dir>    move history storage (discards existing history)
  quit              exit"
    );
}

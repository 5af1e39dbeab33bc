use crate::ui::progress_message::ProgressMessage;
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// File progress bar driven by [`ProgressMessage`]s from the coordinator
pub struct ProgressManager {
    files: ProgressBar,
    problems: Arc<AtomicUsize>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressManager {
    pub fn new(total_files: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let files = if console::Term::stderr().is_term() && !crate::output::is_quiet() {
            let bar = ProgressBar::new(total_files as u64).with_message("Linting");
            if let Ok(style) = ProgressStyle::with_template("{spinner} {bar:30} {pos}/{len} {wide_msg}") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let problems = Arc::new(AtomicUsize::new(0));
        let files_clone = files.clone();
        let problems_clone = problems.clone();

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started { total } => {
                        files_clone.set_length(total as u64);
                        files_clone.enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::Analyzed { file, errors, warnings } => {
                        problems_clone.fetch_add(errors + warnings, Ordering::Relaxed);
                        files_clone.inc(1);
                        files_clone.set_message(file);
                    }
                    ProgressMessage::Failed { file } => {
                        files_clone.inc(1);
                        files_clone.set_message(format!("failed: {}", file));
                    }
                    ProgressMessage::Finished => {
                        files_clone.finish_and_clear();
                        break;
                    }
                }
            }
        });

        (
            Self {
                files,
                problems,
                handle: Some(handle),
            },
            tx,
        )
    }

    /// Diagnostics seen so far across all files
    pub fn problems(&self) -> usize {
        self.problems.load(Ordering::Relaxed)
    }

    /// Wait for the display thread after `Finished` has been sent
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
        self.files.finish_and_clear();
    }

    pub fn finish_with_summary(&mut self, duration: Duration, files: usize, tokens: usize) {
        self.join();
        if crate::output::is_quiet() {
            return;
        }
        println!(
            "{} {}",
            Icons::CLOCK.style(theme().dim),
            format!("Linted in {}", HumanDuration(duration)).style(theme().dim)
        );
        println!(
            "  {} {} files  {} {} tokens  {} {} problems",
            Icons::FILE.style(theme().info),
            files,
            Icons::PACKAGE.style(theme().info),
            tokens,
            Icons::WARN.style(theme().warn),
            self.problems()
        );
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if crate::output::is_quiet() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_message(message.to_string());
        if console::Term::stdout().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.pb.suspend(f)
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}

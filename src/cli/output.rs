//! Output formatting and progress indicators
//!
//! Renders build events as colored status lines and a compile progress bar.

use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{AnsiColors, OwoColorize, Stream};

use crate::core::events::{BuildEvent, Reporter};

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";
}

/// Indentation of every status line
const INDENT: &str = "    ";

/// Create a progress bar for one project's compile steps
pub fn create_compile_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("    {prefix:.bold.blue} [{bar:25.green/blue}] {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("=> "),
    );
    pb.set_prefix("Compiling");
    pb
}

fn print_status(label: &str, color: AnsiColors, message: impl Display) {
    println!(
        "{INDENT}{} {message}",
        label.if_supports_color(Stream::Stdout, |s| s.color(color).bold().to_string()),
    );
}

/// Print the program banner
pub fn print_banner(version: &str) {
    print_status("Bake", AnsiColors::Red, version);
}

/// Print which build file is in use
pub fn print_build_file(path: &Path) {
    print_status("Using", AnsiColors::Yellow, format!("bakefile: {}", path.display()));
}

/// Print an error and every distinct cause beneath it
pub fn display_error(err: &anyhow::Error) {
    eprintln!(
        "{} {err}",
        format!("{} error:", status::ERROR).if_supports_color(Stream::Stderr, |s| s.red().bold().to_string()),
    );
    let mut previous = err.to_string();
    for cause in err.chain().skip(1) {
        let message = cause.to_string();
        if !previous.contains(&message) {
            eprintln!("  caused by: {message}");
        }
        previous = message;
    }
}

struct ActiveBar {
    project: String,
    bar: ProgressBar,
}

/// Console reporter
///
/// Status lines go to stdout, the progress bar to stderr.
#[derive(Default)]
pub struct ConsoleReporter {
    quiet: bool,
    active: Mutex<Option<ActiveBar>>,
}

impl ConsoleReporter {
    /// Create a reporter; a quiet one prints nothing
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            active: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(active) = active.take() {
                active.bar.finish_and_clear();
            }
        }
    }

    /// Advance the project's bar by one unit
    ///
    /// Parallel workers report out of order; the bar counts events instead
    /// of following `index`.
    fn compiling(&self, project: &str, total: usize, source: &Path) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if active.as_ref().map(|a| a.project.as_str()) != Some(project) {
            if let Some(old) = active.take() {
                old.bar.finish_and_clear();
            }
            *active = Some(ActiveBar {
                project: project.to_string(),
                bar: create_compile_bar(total as u64),
            });
        }
        if let Some(active) = active.as_ref() {
            let name = source.file_name().map_or_else(
                || source.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
            active.bar.inc(1);
            active.bar.set_message(name);
        }
    }

    /// Print the final success line
    pub fn print_done(&self) {
        if self.quiet {
            return;
        }
        self.finish_bar();
        println!(
            "{INDENT}{} Build complete",
            status::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green().to_string())
        );
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &BuildEvent) {
        if self.quiet {
            return;
        }
        match event {
            BuildEvent::Compiling {
                project,
                total,
                source,
                ..
            } => self.compiling(project, *total, source),
            BuildEvent::ExternalStarted { name } => print_status("External", AnsiColors::Cyan, name),
            BuildEvent::ProjectStarted { name } => print_status("Building", AnsiColors::Green, name),
            BuildEvent::DependencyFetched { name } => {
                print_status("Fetching", AnsiColors::Yellow, name);
            }
            BuildEvent::UpToDate { project } => {
                print_status("Fresh", AnsiColors::Green, project);
            }
            BuildEvent::Linking { project } => {
                self.finish_bar();
                print_status("Linking", AnsiColors::Magenta, project);
            }
            BuildEvent::ProjectFinished { name } => {
                print_status("Finished", AnsiColors::Blue, name);
            }
        }
    }
}

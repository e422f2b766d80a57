use colored::Colorize;
use console::Term;
use legal_digest::{ProgressEvent, ProgressReporter};

/// Single-line progress on stderr, rewritten in place.
pub struct TerminalProgress {
    term: Term,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgress {
    fn report(&self, event: ProgressEvent) {
        let line = format!(
            "  {} {} {}/{}",
            event.pipeline.to_string().cyan(),
            event.stage,
            event.completed,
            event.total
        );
        // Progress output is best-effort.
        let _ = self.term.clear_line();
        let _ = self.term.write_str(&line);

        // Keep the finished line of each stage or pass.
        if event.completed == event.total {
            let _ = self.term.write_line("");
        }
    }
}

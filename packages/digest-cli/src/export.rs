//! Markdown report of a digest session.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use legal_digest::{Artifact, ConversationTurn, Role, Session};
use std::fmt::Write as _;
use std::path::Path;

/// Everything a report shows. Text is written as-is, UTF-8 included.
pub struct Report<'a> {
    pub source: &'a str,
    pub summary: Option<&'a Artifact>,
    pub risk: Option<&'a Artifact>,
    pub history: &'a [ConversationTurn],
    pub generated_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn from_session(session: &'a Session) -> Self {
        Self {
            source: session
                .document()
                .map(|d| d.source.as_str())
                .unwrap_or("(no document)"),
            summary: session.summary(),
            risk: session.risk_report(),
            history: session.history(),
            generated_at: Utc::now(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "# Legal Document Analysis: {}\n", self.source);
        let _ = writeln!(
            out,
            "_Generated {}_\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );

        for artifact in [self.summary, self.risk].into_iter().flatten() {
            let _ = writeln!(out, "## {}\n", artifact.kind.label());
            let _ = writeln!(out, "{}\n", artifact.text.trim_end());
        }

        if !self.history.is_empty() {
            let _ = writeln!(out, "## Questions & Answers\n");
            for turn in self.history {
                let speaker = match turn.role {
                    Role::User => "**Q:**",
                    Role::Assistant => "**A:**",
                };
                let _ = writeln!(out, "{} {}\n", speaker, turn.text.trim_end());
            }
        }

        out
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

pub mod compact;
pub mod ingest;
pub mod rank;
pub mod show;
pub mod stats;
pub mod status;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn merge(&mut self, mut other: CommandReport) {
        self.ok &= other.ok;
        self.details.append(&mut other.details);
        self.issues.append(&mut other.issues);
    }
}

/// Record the outcome of a command in the audit log. Audit failures are
/// surfaced as details so they never mask the command's own result.
pub fn audit_report(paths: &crate::shelf::paths::ShelfPaths, report: &mut CommandReport) {
    let status = if report.ok { "ok" } else { "issues" };
    let message = if report.ok {
        report.details.join("; ")
    } else {
        report.issues.join("; ")
    };
    if let Err(err) = crate::shelf::audit::append_event(paths, &report.command, status, &message) {
        report.detail(format!("audit log write failed: {err:#}"));
    }
}

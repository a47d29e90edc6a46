//! Terminal output for export progress and page listings.

use std::io;
use std::path::Path;

use console::{Style, Term};

/// Progress and results on stderr, listings on stdout.
pub(crate) struct Output {
    err: Term,
    out: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            err: Term::stderr(),
            out: Term::stdout(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print a `label: value` line with the label dimmed.
    pub(crate) fn field(&self, label: &str, value: impl std::fmt::Display) {
        let _ = self
            .err
            .write_line(&format!("{} {value}", self.dim.apply_to(format!("{label}:"))));
    }

    /// Print a warning (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.err.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Report a written file: `what` in green, the path in cyan bold.
    pub(crate) fn written(&self, what: &str, path: &Path) {
        let _ = self.err.write_line(&format!(
            "{} {}",
            self.green.apply_to(format!("{what} written to")),
            self.cyan_bold.apply_to(path.display())
        ));
    }

    /// Print one scanned page as `level<TAB>path` on stdout.
    pub(crate) fn page(&self, level: usize, path: &str) -> io::Result<()> {
        self.out.write_line(&format!("{level}\t{path}"))
    }
}

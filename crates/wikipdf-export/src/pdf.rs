//! HTML to PDF rendering through a headless browser.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::ExportError;

/// Executable names searched on `PATH`, in order.
const CHROME_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default time allowed for one PDF conversion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Converts an HTML file into a PDF file.
pub trait PdfRenderer {
    /// Render the document at `html` into `pdf`.
    fn render(&self, html: &Path, pdf: &Path) -> Result<(), ExportError>;
}

/// Renders PDFs with a headless Chrome or Chromium.
#[derive(Clone, Debug)]
pub struct ChromeRenderer {
    executable: PathBuf,
    timeout: Duration,
}

impl ChromeRenderer {
    /// Use the browser at `executable`.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use `chrome_path` when given, otherwise the first browser found on
    /// `PATH`.
    pub fn discover(chrome_path: Option<&Path>) -> Result<Self, ExportError> {
        if let Some(path) = chrome_path {
            return Ok(Self::new(path));
        }
        let executable = find_executable(CHROME_NAMES).ok_or(ExportError::RendererNotFound)?;
        tracing::debug!(path = %executable.display(), "Found browser");
        Ok(Self::new(executable))
    }

    /// Set the conversion timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Browser executable in use.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn args(html: &Path, pdf: &Path) -> Vec<OsString> {
        let mut print_to_pdf = OsString::from("--print-to-pdf=");
        print_to_pdf.push(pdf);
        vec![
            "--headless".into(),
            "--disable-gpu".into(),
            "--no-pdf-header-footer".into(),
            "--run-all-compositor-stages-before-draw".into(),
            "--virtual-time-budget=10000".into(),
            print_to_pdf,
            html.as_os_str().to_owned(),
        ]
    }

    fn wait(&self, mut child: Child) -> Result<(), ExportError> {
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut output = String::new();
                let _ = pipe.read_to_string(&mut output);
                output
            })
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExportError::RendererTimeout(self.timeout.as_secs()));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(ExportError::io(&self.executable, e)),
            }
        };

        if status.success() {
            return Ok(());
        }
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        Err(ExportError::RendererFailed {
            status: status.to_string(),
            stderr: stderr.trim().to_owned(),
        })
    }
}

impl PdfRenderer for ChromeRenderer {
    fn render(&self, html: &Path, pdf: &Path) -> Result<(), ExportError> {
        tracing::info!(
            browser = %self.executable.display(),
            output = %pdf.display(),
            "Rendering PDF"
        );
        let child = Command::new(&self.executable)
            .args(Self::args(html, pdf))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ExportError::RendererNotFound
                } else {
                    ExportError::io(&self.executable, e)
                }
            })?;
        self.wait(child)?;

        if !pdf.is_file() {
            return Err(ExportError::RendererFailed {
                status: "exit 0".to_owned(),
                stderr: format!("no PDF written to {}", pdf.display()),
            });
        }
        Ok(())
    }
}

/// Render `html` to `output` through a temporary file.
///
/// With `keep_html` the document is also saved as `<output>.html`, before
/// rendering so it survives a failed conversion.
pub fn write_pdf(
    html: &str,
    renderer: &dyn PdfRenderer,
    output: &Path,
    keep_html: bool,
) -> Result<(), ExportError> {
    let mut temp = tempfile::Builder::new()
        .prefix("wikipdf-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| ExportError::io(std::env::temp_dir(), e))?;
    temp.write_all(html.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|e| ExportError::io(temp.path(), e))?;

    create_parent(output)?;
    if keep_html {
        write_html(html, &kept_html_path(output))?;
    }

    renderer.render(temp.path(), output)?;
    tracing::info!(path = %output.display(), "PDF written");
    Ok(())
}

/// Write the HTML document to `path`.
pub fn write_html(html: &str, path: &Path) -> Result<(), ExportError> {
    create_parent(path)?;
    fs::write(path, html).map_err(|e| ExportError::io(path, e))?;
    tracing::info!(path = %path.display(), "HTML written");
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
    }
    Ok(())
}

/// `export.pdf` keeps its HTML as `export.pdf.html`.
#[must_use]
pub fn kept_html_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".html");
    PathBuf::from(path)
}

fn find_executable(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| {
        names.iter().find_map(|name| {
            let candidate = dir.join(executable_name(name));
            candidate.is_file().then_some(candidate)
        })
    })
}

fn executable_name(name: &str) -> OsString {
    let mut name = OsStr::new(name).to_owned();
    if cfg!(windows) {
        name.push(".exe");
    }
    name
}

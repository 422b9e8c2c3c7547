// 🖨️ Print renderer - minimal standalone HTML for print preview
//
// Every piece of record data (and the title and headers) is HTML-escaped.

use super::Table;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

const PRINT_STYLE: &str = "body { font-family: Arial, sans-serif; padding: 16px; }
      h2 { margin-bottom: 14px; }
      table { width: 100%; border-collapse: collapse; }
      th, td { border: 1px solid #bbb; padding: 8px; text-align: left; font-size: 12px; }
      th { background: #f0f0f0; }";

/// Escape `&`, `<`, `>`, `"` and `'`
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_html(title: &str, table: &Table) -> String {
    let title = escape_html(title);

    let head: String = table
        .header
        .iter()
        .map(|h| format!("<th>{}</th>", escape_html(h)))
        .collect();

    let body: String = table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape_html(&cell.to_string())))
                .collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();

    format!(
        "<html>
  <head>
    <title>{title}</title>
    <style>
      {style}
    </style>
  </head>
  <body>
    <h2>{title}</h2>
    <table>
      <thead><tr>{head}</tr></thead>
      <tbody>{body}</tbody>
    </table>
  </body>
</html>
",
        title = title,
        style = PRINT_STYLE,
        head = head,
        body = body,
    )
}

// ============================================================================
// PRINT SURFACES
// ============================================================================

/// Whatever actually prints: a browser window, a spooler, a file on disk
pub trait PrintSurface {
    /// Hand over a finished document. Returns where it landed, if anywhere.
    fn present(&self, file_stem: &str, html: &str) -> Result<Option<PathBuf>>;
}

/// Writes `<stem>.html` into a directory for the user to open and print
pub struct DirectorySurface {
    dir: PathBuf,
}

impl DirectorySurface {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySurface { dir: dir.into() }
    }
}

impl PrintSurface for DirectorySurface {
    fn present(&self, file_stem: &str, html: &str) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create print directory: {:?}", self.dir))?;

        let path = self.dir.join(format!("{}.html", file_stem));
        fs::write(&path, html).with_context(|| format!("Failed to write print file: {:?}", path))?;

        info!(path = %path.display(), "print preview ready");
        Ok(Some(path))
    }
}

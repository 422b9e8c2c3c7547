// 📤 Tabular Exporter - One column contract, three renderers
//
// Flow:
//   rows + columns ──tabularize──▶ Table (header + normalized cells)
//                                    ├──▶ spreadsheet::Workbook  (.xlsx, one sheet; or .csv)
//                                    ├──▶ paged::PagedDocument   (.pdf, title + paged table; or .txt)
//                                    └──▶ print::render_html     (escaped standalone HTML)
//
// Cell normalization happens once, in `cell_value`, so the three outputs can
// never disagree and no field shape can make an export fail.

pub mod catalog;
pub mod paged;
pub mod print;
pub mod spreadsheet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub use catalog::ReportKind;
pub use paged::PagedDocument;
pub use print::{escape_html, render_html, DirectorySurface, PrintSurface};
pub use spreadsheet::Workbook;

// ============================================================================
// CELL VALUES
// ============================================================================

/// Normalized cell: always a string, number or boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", b),
            // Integral amounts print without a trailing ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// null/absent → "", scalars pass through, anything else → compact JSON
pub fn cell_value(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::empty(),
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => CellValue::Number(f),
            None => CellValue::Text(n.to_string()),
        },
        Some(Value::String(s)) => CellValue::Text(s.clone()),
        Some(other) => CellValue::Text(other.to_string()),
    }
}

// ============================================================================
// COLUMNS & TABLE
// ============================================================================

/// One output column: the header text and the record field it reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub header: String,
    pub key: String,
}

impl Column {
    pub fn new(header: impl Into<String>, key: impl Into<String>) -> Self {
        Column {
            header: header.into(),
            key: key.into(),
        }
    }
}

/// Header + body as already-normalized cells, shared by every renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Project records through a column specification.
///
/// Records are serialized with serde and each column key is looked up on the
/// resulting object. A record that cannot be serialized yields a row of empty
/// cells instead of an error.
pub fn tabularize<R: Serialize>(rows: &[R], columns: &[Column]) -> Table {
    let header = columns.iter().map(|c| c.header.clone()).collect();

    let body = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let value = serde_json::to_value(row).unwrap_or_else(|e| {
                warn!(row = index, "record could not be serialized for export: {}", e);
                Value::Null
            });
            columns
                .iter()
                .map(|col| cell_value(value.get(col.key.as_str())))
                .collect()
        })
        .collect();

    Table { header, rows: body }
}

// ============================================================================
// EXPORT FORMATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Spreadsheet,
    Pdf,
    Print,
    Csv,
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Print => "html",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "xlsx" | "spreadsheet" | "excel" => Ok(ExportFormat::Spreadsheet),
            "pdf" => Ok(ExportFormat::Pdf),
            "print" | "html" => Ok(ExportFormat::Print),
            "csv" => Ok(ExportFormat::Csv),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => anyhow::bail!("Unknown export format: {}", other),
        }
    }
}

/// What an export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArtifact {
    pub format: ExportFormat,
    pub path: Option<PathBuf>,
    pub cell_count: usize,
}

// ============================================================================
// EXPORTER
// ============================================================================

pub struct Exporter {
    output_dir: PathBuf,
    rows_per_page: usize,
    surface: Box<dyn PrintSurface>,
}

impl Exporter {
    /// Exporter writing every artifact into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, rows_per_page: usize) -> Self {
        let output_dir = output_dir.into();
        Exporter {
            surface: Box::new(DirectorySurface::new(output_dir.clone())),
            output_dir,
            rows_per_page,
        }
    }

    /// Spreadsheet: one "Report" sheet, header row, one row per record
    pub fn export_spreadsheet<R: Serialize>(
        &self,
        file_stem: &str,
        rows: &[R],
        columns: &[Column],
    ) -> Result<PathBuf> {
        self.write_spreadsheet(file_stem, tabularize(rows, columns))
    }

    /// Paged document: title block followed by the table
    pub fn export_pdf<R: Serialize>(
        &self,
        title: &str,
        file_stem: &str,
        rows: &[R],
        columns: &[Column],
    ) -> Result<PathBuf> {
        self.write_paged(title, file_stem, tabularize(rows, columns))
    }

    /// Print preview: escaped standalone HTML handed to the print surface
    pub fn print_table<R: Serialize>(
        &self,
        title: &str,
        file_stem: &str,
        rows: &[R],
        columns: &[Column],
    ) -> Result<(String, Option<PathBuf>)> {
        self.present_print(title, file_stem, &tabularize(rows, columns))
    }

    /// Export one catalog report in the requested format
    pub fn export<R: Serialize>(
        &self,
        kind: ReportKind,
        format: ExportFormat,
        rows: &[R],
    ) -> Result<ExportedArtifact> {
        self.export_table(kind, format, tabularize(rows, &kind.columns()))
    }

    /// Same as `export`, for a table that is already projected
    pub fn export_table(
        &self,
        kind: ReportKind,
        format: ExportFormat,
        table: Table,
    ) -> Result<ExportedArtifact> {
        let cell_count = table.cell_count();
        let path = match format {
            ExportFormat::Spreadsheet => Some(self.write_spreadsheet(kind.file_stem(), table)?),
            ExportFormat::Pdf => Some(self.write_paged(kind.title(), kind.file_stem(), table)?),
            ExportFormat::Print => self.present_print(kind.title(), kind.file_stem(), &table)?.1,
            ExportFormat::Csv => {
                let bytes = Workbook::from_table(table).to_csv_bytes()?;
                Some(self.write_artifact(kind.file_stem(), format, &bytes)?)
            }
            ExportFormat::Text => {
                let document = PagedDocument::from_table(kind.title(), table, self.rows_per_page);
                Some(self.write_artifact(kind.file_stem(), format, document.render_text().as_bytes())?)
            }
        };

        Ok(ExportedArtifact {
            format,
            path,
            cell_count,
        })
    }

    fn write_spreadsheet(&self, file_stem: &str, table: Table) -> Result<PathBuf> {
        let bytes = Workbook::from_table(table).to_xlsx_bytes()?;
        self.write_artifact(file_stem, ExportFormat::Spreadsheet, &bytes)
    }

    fn write_paged(&self, title: &str, file_stem: &str, table: Table) -> Result<PathBuf> {
        let document = PagedDocument::from_table(title, table, self.rows_per_page);
        self.write_artifact(file_stem, ExportFormat::Pdf, &document.render_pdf()?)
    }

    fn present_print(
        &self,
        title: &str,
        file_stem: &str,
        table: &Table,
    ) -> Result<(String, Option<PathBuf>)> {
        let html = render_html(title, table);
        let location = self.surface.present(file_stem, &html)?;
        Ok((html, location))
    }

    fn write_artifact(&self, file_stem: &str, format: ExportFormat, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create export directory: {:?}", self.output_dir)
        })?;

        let path = self
            .output_dir
            .join(format!("{}.{}", file_stem, format.extension()));
        fs::write(&path, bytes).with_context(|| format!("Failed to write export: {:?}", path))?;

        info!(format = ?format, path = %path.display(), bytes = bytes.len(), "export written");
        Ok(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================

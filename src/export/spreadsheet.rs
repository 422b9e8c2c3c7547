// 📊 Spreadsheet renderer - single "Report" sheet
//
// The workbook is written as a real .xlsx (header row in bold, one row per
// record). CSV with a UTF-8 BOM is kept as a plain-text alternative.

use super::{CellValue, Table};
use anyhow::{Context, Result};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook as XlsxWorkbook};

pub const SHEET_NAME: &str = "Report";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub sheet_name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Workbook {
    pub fn from_table(table: Table) -> Self {
        Workbook {
            sheet_name: SHEET_NAME.to_string(),
            header: table.header,
            rows: table.rows,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        let mut book = XlsxWorkbook::new();
        let bold = Format::new().set_bold();

        {
            let sheet = book.add_worksheet();
            sheet
                .set_name(&self.sheet_name)
                .context("Invalid sheet name")?;

            for (col, header) in self.header.iter().enumerate() {
                sheet
                    .write_string_with_format(0, col_num(col)?, header, &bold)
                    .context("Failed to write spreadsheet header")?;
            }

            for (index, row) in self.rows.iter().enumerate() {
                let row_num = RowNum::try_from(index + 1).context("Too many spreadsheet rows")?;
                for (col, cell) in row.iter().enumerate() {
                    let col = col_num(col)?;
                    match cell {
                        CellValue::Number(n) => sheet.write_number(row_num, col, *n),
                        CellValue::Bool(b) => sheet.write_boolean(row_num, col, *b),
                        CellValue::Text(s) if s.is_empty() => continue,
                        CellValue::Text(s) => sheet.write_string(row_num, col, s),
                    }
                    .context("Failed to write spreadsheet cell")?;
                }
            }

            sheet.autofit();
        }

        book.save_to_buffer().context("Failed to build xlsx workbook")
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = UTF8_BOM.to_vec();
        {
            let mut wtr = csv::Writer::from_writer(&mut buffer);
            wtr.write_record(&self.header)
                .context("Failed to write spreadsheet header")?;

            for row in &self.rows {
                wtr.write_record(row.iter().map(|cell| cell.to_string()))
                    .context("Failed to write spreadsheet row")?;
            }
            wtr.flush().context("Failed to flush spreadsheet")?;
        }
        Ok(buffer)
    }
}

fn col_num(index: usize) -> Result<ColNum> {
    ColNum::try_from(index).context("Too many spreadsheet columns")
}

//! Spreadsheet output

use crate::resource::{Cell, Table};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;

/// Excel's limit on worksheet name length
pub const MAX_SHEET_NAME: usize = 31;

/// Excel's limit on the characters of one cell
pub const MAX_CELL_CHARS: usize = 32_767;

/// One worksheet to write
pub struct Sheet<'a> {
    pub name: String,
    pub table: &'a Table,
}

/// Hands out worksheet names that fit Excel's limit and never repeat
#[derive(Debug, Default)]
pub struct SheetNames {
    used: HashSet<String>,
}

impl SheetNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<prefix>_<region>` for regional sheets, the bare prefix for global ones
    pub fn allocate(&mut self, prefix: &str, region: Option<&str>) -> String {
        let base = match region {
            Some(region) => format!("{}_{}", prefix, region),
            None => prefix.to_string(),
        };

        let mut name = truncate(&base, MAX_SHEET_NAME);
        let mut n = 2;
        // Excel compares sheet names case-insensitively
        while self.used.contains(&name.to_lowercase()) {
            let suffix = format!("_{}", n);
            name = format!(
                "{}{}",
                truncate(&base, MAX_SHEET_NAME - suffix.len()),
                suffix
            );
            n += 1;
        }

        self.used.insert(name.to_lowercase());
        name
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Cut text that Excel would reject; the JSON reports keep the full value
fn cell_text<'t>(text: &'t str, column: &str) -> &'t str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            tracing::warn!(
                "Value in column {} truncated to {} characters in the workbook",
                column,
                MAX_CELL_CHARS
            );
            &text[..end]
        },
        None => text,
    }
}

/// Write one worksheet per table; the header row is bold and columns are autofit
pub fn write_workbook(path: &Path, sheets: &[Sheet<'_>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .with_context(|| format!("Invalid worksheet name: {}", sheet.name))?;
        write_table(worksheet, sheet.table, &header)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &Table, header: &Format) -> Result<()> {
    for (col, name) in table.columns().into_iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let line = index as u32 + 1;
        for (col, (column, cell)) in row.columns().zip(row.cells()).enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(line, col, cell_text(text, column))?;
                },
                Cell::Integer(n) => {
                    worksheet.write_number(line, col, *n as f64)?;
                },
                Cell::Bool(b) => {
                    worksheet.write_boolean(line, col, *b)?;
                },
                Cell::List(items) => {
                    let joined = items.join("\n");
                    worksheet.write_string(line, col, cell_text(&joined, column))?;
                },
                Cell::Null => {},
            }
        }
    }

    worksheet.autofit();
    Ok(())
}

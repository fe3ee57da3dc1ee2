//! Spreadsheet export adapter.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::domain::ports::{ExportRenderError, ExportRenderer};
use crate::domain::telemetry::Reading;

/// Worksheet name used for exports.
pub const SHEET_NAME: &str = "Sensor Data";

const HEADERS: [&str; 5] = ["Timestamp", "Sensor_ID", "Value", "Unit", "Status"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders readings as a single-sheet `.xlsx` workbook.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxExportRenderer;

fn map_xlsx_error(error: XlsxError) -> ExportRenderError {
    ExportRenderError::render(error.to_string())
}

fn cells(reading: &Reading) -> [String; 5] {
    [
        reading.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        reading.sensor_name.to_string(),
        reading.value.to_string(),
        reading.unit.clone(),
        reading.status.to_string(),
    ]
}

impl ExportRenderer for XlsxExportRenderer {
    fn content_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }

    fn render(&self, readings: &[Reading]) -> Result<Vec<u8>, ExportRenderError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(map_xlsx_error)?;

        let mut widths = HEADERS.map(str::len);
        for (col, title) in (0_u16..).zip(HEADERS) {
            sheet
                .write_string_with_format(0, col, title, &header)
                .map_err(map_xlsx_error)?;
        }

        for (row, reading) in (1_u32..).zip(readings) {
            let text = cells(reading);
            for ((col, value), width) in (0_u16..).zip(&text).zip(widths.iter_mut()) {
                *width = (*width).max(value.chars().count());
                if col == 2 {
                    sheet
                        .write_number(row, col, reading.value)
                        .map_err(map_xlsx_error)?;
                } else {
                    sheet
                        .write_string(row, col, value)
                        .map_err(map_xlsx_error)?;
                }
            }
        }

        for (col, width) in (0_u16..).zip(widths) {
            let width = u32::try_from(width + 2).unwrap_or(u32::MAX);
            sheet
                .set_column_width(col, f64::from(width))
                .map_err(map_xlsx_error)?;
        }

        workbook.save_to_buffer().map_err(map_xlsx_error)
    }
}

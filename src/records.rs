//! Record store: loads the notification spreadsheet into memory.
//!
//! The first row is the header. Header cells are trimmed and lowercased,
//! then mapped to [`NotificationRecord`] fields through an alias table that
//! accepts both English and Portuguese column names. Columns that map to no
//! field are ignored; the only schema requirement is an address column.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::error::{DataSource, QueryError};
use crate::models::{NotificationDataset, NotificationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Address,
    Owner,
    Status,
    Date,
    Sector,
    Article,
    Remark,
}

const ALIASES: &[(&str, Field)] = &[
    ("address", Field::Address),
    ("endereco", Field::Address),
    ("endereço", Field::Address),
    ("owner", Field::Owner),
    ("proprietario", Field::Owner),
    ("proprietário", Field::Owner),
    ("status", Field::Status),
    ("situacao", Field::Status),
    ("situação", Field::Status),
    ("date", Field::Date),
    ("data", Field::Date),
    ("sector", Field::Sector),
    ("setor", Field::Sector),
    ("article", Field::Article),
    ("artigo", Field::Article),
    ("remark", Field::Remark),
    ("remarks", Field::Remark),
    ("observacao", Field::Remark),
    ("observação", Field::Remark),
    ("observacoes", Field::Remark),
    ("observações", Field::Remark),
];

/// Trims and case-folds a header cell.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn field_for_header(raw: &str) -> Option<Field> {
    let name = normalize_header(raw);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, field)| *field)
}

/// Loads the dataset from a spreadsheet file.
///
/// Reads the sheet named `sheet`, or the first sheet when `None`.
///
/// # Errors
///
/// [`QueryError::DataUnavailable`] when the file is missing or unreadable,
/// the sheet does not exist, there is no address column, or no data row
/// has an address.
pub fn load(path: &Path, sheet: Option<&str>) -> Result<NotificationDataset, QueryError> {
    let unavailable = |reason: String| QueryError::data_unavailable(DataSource::Spreadsheet, reason);

    if !path.exists() {
        return Err(unavailable(format!("file not found: {}", path.display())));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| unavailable(format!("cannot open {}: {}", path.display(), e)))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| unavailable("workbook has no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| unavailable(format!("cannot read sheet '{}': {}", sheet_name, e)))?;

    let rows: Vec<Vec<Option<String>>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let dataset = dataset_from_rows(&rows).map_err(unavailable)?;
    tracing::info!(
        path = %path.display(),
        sheet = %sheet_name,
        records = dataset.len(),
        "loaded notification spreadsheet"
    );
    Ok(dataset)
}

/// Builds a dataset from a header row followed by data rows.
fn dataset_from_rows(rows: &[Vec<Option<String>>]) -> Result<NotificationDataset, String> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| "spreadsheet is empty".to_string())?;

    let columns: Vec<Option<Field>> = header
        .iter()
        .map(|cell| cell.as_deref().and_then(field_for_header))
        .collect();

    if !columns.contains(&Some(Field::Address)) {
        return Err("spreadsheet has no address column".to_string());
    }

    let mut records = Vec::new();
    for (idx, row) in body.iter().enumerate() {
        if row.iter().all(Option::is_none) {
            continue;
        }
        match record_from_row(&columns, row) {
            Some(record) => records.push(record),
            // +2: one for the header, one for 1-based sheet rows
            None => tracing::warn!(row = idx + 2, "skipping notification without address"),
        }
    }

    if records.is_empty() {
        return Err("spreadsheet has no notification rows".to_string());
    }

    Ok(NotificationDataset::new(records))
}

fn record_from_row(columns: &[Option<Field>], row: &[Option<String>]) -> Option<NotificationRecord> {
    let mut record = NotificationRecord::default();
    let mut address = None;

    for (field, value) in columns.iter().zip(row.iter()) {
        let (Some(field), Some(value)) = (field, value) else {
            continue;
        };
        let slot = match field {
            Field::Address => &mut address,
            Field::Owner => &mut record.owner,
            Field::Status => &mut record.status,
            Field::Date => &mut record.date,
            Field::Sector => &mut record.sector,
            Field::Article => &mut record.article,
            Field::Remark => &mut record.remark,
        };
        // Duplicate columns: the leftmost non-empty value wins.
        if slot.is_none() {
            *slot = Some(value.clone());
        }
    }

    record.address = address?;
    Some(record)
}

/// Renders one cell as trimmed text; `None` for blanks.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => format_datetime(ndt),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            tracing::debug!(error = ?e, "spreadsheet cell holds an error value");
            return None;
        }
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn format_datetime(dt: chrono::NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    None
                } else {
                    Some(c.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn headers_are_case_and_whitespace_insensitive() {
        let rows = vec![
            row(&["  ENDEREÇO ", "Proprietario", " Status", "DATA"]),
            row(&["Rua Principal, 100", "João", "Pendente", "2024-01-15"]),
        ];
        let ds = dataset_from_rows(&rows).unwrap();
        let rec = ds.get(0).unwrap();
        assert_eq!(rec.address, "Rua Principal, 100");
        assert_eq!(rec.owner.as_deref(), Some("João"));
        assert_eq!(rec.status.as_deref(), Some("Pendente"));
        assert_eq!(rec.date.as_deref(), Some("2024-01-15"));
        assert!(rec.sector.is_none());
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let rows = vec![
            row(&["Address", "Inspector"]),
            row(&["Av. Central, 9", "Carlos"]),
        ];
        let ds = dataset_from_rows(&rows).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0).unwrap(), &NotificationRecord::new("Av. Central, 9"));
    }

    #[test]
    fn rows_without_address_are_skipped() {
        let rows = vec![
            row(&["address", "owner"]),
            row(&["", "Nobody"]),
            row(&["", ""]),
            row(&["Rua B, 2", "Ana"]),
        ];
        let ds = dataset_from_rows(&rows).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0).unwrap().address, "Rua B, 2");
    }

    #[test]
    fn missing_address_column_is_rejected() {
        let rows = vec![row(&["owner", "status"]), row(&["Ana", "Open"])];
        let err = dataset_from_rows(&rows).unwrap_err();
        assert!(err.contains("address column"));
    }

    #[test]
    fn header_only_is_empty() {
        let rows = vec![row(&["address", "owner"])];
        assert!(dataset_from_rows(&rows).is_err());
        assert!(dataset_from_rows(&[]).is_err());
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let err = load(Path::new("/nonexistent/planilha.xlsx"), None).unwrap_err();
        assert!(matches!(
            err,
            QueryError::DataUnavailable {
                input: DataSource::Spreadsheet,
                ..
            }
        ));
    }

    #[test]
    fn garbage_file_is_data_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("planilha.xlsx");
        std::fs::write(&path, b"not a spreadsheet").unwrap();
        assert!(matches!(
            load(&path, None),
            Err(QueryError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn whole_floats_render_as_integers() {
        assert_eq!(cell_text(&Data::Float(100.0)).as_deref(), Some("100"));
        assert_eq!(cell_text(&Data::Float(2.5)).as_deref(), Some("2.5"));
        assert_eq!(cell_text(&Data::String("  ".into())), None);
        assert_eq!(cell_text(&Data::Empty), None);
    }

    #[test]
    fn date_cells_render_as_iso_dates() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let midnight = Data::DateTime(ExcelDateTime::new(
            45306.0,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(cell_text(&midnight).as_deref(), Some("2024-01-15"));

        let evening = Data::DateTime(ExcelDateTime::new(
            45306.75,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(cell_text(&evening).as_deref(), Some("2024-01-15 18:00:00"));
    }
}

//! Export layer
//!
//! Renders a filtered module set into CSV, a styled spreadsheet or JSON.
//! A field specification — ordered (accessor path, header) pairs, where a
//! path may traverse one nested level with dot notation — selects the
//! columns; derived accessors (tags list, like count, creator name) are
//! precomputed into each record before rendering.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use std::collections::BTreeMap;

use crate::services::module::ExportRow;

/// UTF-8 byte-order mark prefixed to CSV output so common spreadsheet
/// tools pick the right encoding.
const CSV_BOM: &[u8] = "\u{feff}".as_bytes();

/// Fixed timestamp format for textual exports
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell value in an export record
#[derive(Debug, Clone)]
pub enum ExportValue {
    Null,
    Text(String),
    Int(i64),
    DateTime(DateTime<Utc>),
    /// Composite values render as their textual JSON form
    Json(serde_json::Value),
    /// One level of nesting, addressed with dot notation
    Nested(BTreeMap<String, ExportValue>),
}

/// One exported entity as a flat-ish record
pub type ExportRecord = BTreeMap<String, ExportValue>;

/// (accessor path, header label)
#[derive(Debug, Clone)]
pub struct ExportField {
    pub path: &'static str,
    pub header: &'static str,
}

/// The default module export specification
pub fn default_module_fields() -> Vec<ExportField> {
    vec![
        ExportField { path: "id", header: "ID" },
        ExportField { path: "name", header: "Name" },
        ExportField { path: "company", header: "Company" },
        ExportField { path: "country", header: "Country" },
        ExportField { path: "params_count", header: "Parameters Count" },
        ExportField { path: "short_description", header: "Description" },
        ExportField { path: "status", header: "Status" },
        ExportField { path: "version", header: "Version" },
        ExportField { path: "license", header: "License" },
        ExportField { path: "created_by.username", header: "Created By" },
        ExportField { path: "created_at", header: "Created At" },
        ExportField { path: "published_at", header: "Published At" },
        ExportField { path: "tags", header: "Tags" },
        ExportField { path: "like_count", header: "Likes" },
        ExportField { path: "publications_count", header: "Publications" },
    ]
}

/// Build the export record for one module row.
pub fn module_record(row: &ExportRow) -> ExportRecord {
    let module = &row.module.module;
    let mut record = ExportRecord::new();

    record.insert("id".into(), ExportValue::Int(module.id));
    record.insert("name".into(), ExportValue::Text(module.name.clone()));
    record.insert("company".into(), ExportValue::Text(module.company.clone()));
    record.insert("country".into(), ExportValue::Text(module.country.clone()));
    record.insert("params_count".into(), ExportValue::Int(module.params_count));
    record.insert(
        "short_description".into(),
        ExportValue::Text(module.short_description.clone()),
    );
    record.insert(
        "status".into(),
        ExportValue::Text(module.status.as_str().to_string()),
    );
    record.insert(
        "version".into(),
        optional_text(&module.version),
    );
    record.insert(
        "license".into(),
        optional_text(&module.license),
    );
    record.insert("created_at".into(), ExportValue::DateTime(module.created_at));
    record.insert(
        "published_at".into(),
        match module.published_at {
            Some(dt) => ExportValue::DateTime(dt),
            None => ExportValue::Null,
        },
    );
    record.insert(
        "tags".into(),
        ExportValue::Json(serde_json::json!(row.tags)),
    );
    record.insert("like_count".into(), ExportValue::Int(row.module.like_count));
    record.insert(
        "publications_count".into(),
        ExportValue::Int(row.publications_count),
    );

    let mut created_by = BTreeMap::new();
    created_by.insert(
        "username".to_string(),
        ExportValue::Text(row.created_by_name.clone()),
    );
    record.insert("created_by".into(), ExportValue::Nested(created_by));

    record
}

fn optional_text(value: &str) -> ExportValue {
    if value.is_empty() {
        ExportValue::Null
    } else {
        ExportValue::Text(value.to_string())
    }
}

static NULL_VALUE: ExportValue = ExportValue::Null;

/// Resolve an accessor path against a record. Dot notation traverses one
/// nested level; anything unresolved reads as `Null`.
pub fn resolve<'a>(record: &'a ExportRecord, path: &str) -> &'a ExportValue {
    if let Some(value) = record.get(path) {
        return value;
    }
    if let Some((head, tail)) = path.split_once('.') {
        if let Some(ExportValue::Nested(nested)) = record.get(head) {
            if let Some(value) = nested.get(tail) {
                return value;
            }
        }
    }
    &NULL_VALUE
}

/// Textual form of a cell, as used by CSV and JSON-ish surfaces. Missing
/// values render as empty strings.
fn render_text(value: &ExportValue) -> String {
    match value {
        ExportValue::Null => String::new(),
        ExportValue::Text(s) => s.clone(),
        ExportValue::Int(i) => i.to_string(),
        ExportValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        ExportValue::Json(v) => v.to_string(),
        ExportValue::Nested(_) => String::new(),
    }
}

/// Render records as CSV with a BOM prefix: one header row, then one row
/// per record.
pub fn to_csv(records: &[ExportRecord], fields: &[ExportField]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(CSV_BOM);

    let mut writer = csv::Writer::from_writer(buf);
    writer
        .write_record(fields.iter().map(|f| f.header))
        .context("Failed to write CSV header")?;

    for record in records {
        writer
            .write_record(fields.iter().map(|f| render_text(resolve(record, f.path))))
            .context("Failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e))
}

/// Render records as a styled XLSX workbook: bold header row on the brand
/// blue, native temporal cells, auto-sized columns capped at width 50.
pub fn to_xlsx(records: &[ExportRecord], fields: &[ExportField]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Export")
        .map_err(|e| anyhow::anyhow!("Failed to name worksheet: {}", e))?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x366092))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut widths: Vec<usize> = fields.iter().map(|f| f.header.len()).collect();

    for (col, field) in fields.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, field.header, &header_format)
            .map_err(|e| anyhow::anyhow!("Failed to write header cell: {}", e))?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col_idx, field) in fields.iter().enumerate() {
            let col = col_idx as u16;
            let value = resolve(record, field.path);
            match value {
                ExportValue::Null | ExportValue::Nested(_) => {}
                ExportValue::Text(s) => {
                    worksheet
                        .write_string(row, col, s)
                        .map_err(|e| anyhow::anyhow!("Failed to write cell: {}", e))?;
                }
                ExportValue::Int(i) => {
                    worksheet
                        .write_number(row, col, *i as f64)
                        .map_err(|e| anyhow::anyhow!("Failed to write cell: {}", e))?;
                }
                ExportValue::DateTime(dt) => {
                    worksheet
                        .write_datetime_with_format(row, col, dt.naive_utc(), &datetime_format)
                        .map_err(|e| anyhow::anyhow!("Failed to write cell: {}", e))?;
                }
                ExportValue::Json(v) => {
                    worksheet
                        .write_string(row, col, v.to_string())
                        .map_err(|e| anyhow::anyhow!("Failed to write cell: {}", e))?;
                }
            }
            widths[col_idx] = widths[col_idx].max(render_text(value).len());
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (*width + 2).min(50) as f64;
        worksheet
            .set_column_width(col as u16, width)
            .map_err(|e| anyhow::anyhow!("Failed to set column width: {}", e))?;
    }

    workbook
        .save_to_buffer()
        .map_err(|e| anyhow::anyhow!("Failed to produce XLSX output: {}", e))
}

/// Render records as the JSON export envelope.
pub fn to_json(records: &[ExportRecord]) -> serde_json::Value {
    let results: Vec<serde_json::Value> = records.iter().map(record_to_json).collect();
    serde_json::json!({
        "count": records.len(),
        "results": results,
        "exported_at": Utc::now().to_rfc3339(),
    })
}

fn record_to_json(record: &ExportRecord) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (key, value) in record {
        map.insert(key.clone(), value_to_json(value));
    }
    serde_json::Value::Object(map)
}

fn value_to_json(value: &ExportValue) -> serde_json::Value {
    match value {
        ExportValue::Null => serde_json::Value::Null,
        ExportValue::Text(s) => serde_json::json!(s),
        ExportValue::Int(i) => serde_json::json!(i),
        ExportValue::DateTime(dt) => serde_json::json!(dt.to_rfc3339()),
        ExportValue::Json(v) => v.clone(),
        ExportValue::Nested(nested) => {
            let mut map = serde_json::Map::new();
            for (key, value) in nested {
                map.insert(key.clone(), value_to_json(value));
            }
            serde_json::Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiModule, ModuleStatus, ModuleWithMeta};
    use chrono::TimeZone;

    fn sample_row(name: &str, published: bool) -> ExportRow {
        let mut module = AiModule::new(
            name.to_string(),
            name.to_lowercase().to_string(),
            "Sber".to_string(),
            "Russia".to_string(),
            1_000_000,
            "Test module".to_string(),
            1,
        );
        module.id = 1;
        module.created_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        if published {
            module.status = ModuleStatus::Active;
            module.published_at = Some(Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap());
        }

        ExportRow {
            module: ModuleWithMeta {
                module,
                like_count: 7,
            },
            tags: vec!["NLP".to_string(), "Vision".to_string()],
            created_by_name: "owner".to_string(),
            publications_count: 2,
        }
    }

    #[test]
    fn test_csv_shape_and_bom() {
        let records: Vec<ExportRecord> = vec![
            module_record(&sample_row("A", true)),
            module_record(&sample_row("B", false)),
        ];
        let fields = default_module_fields();

        let bytes = to_csv(&records, &fields).unwrap();
        assert!(bytes.starts_with(CSV_BOM), "CSV must start with a BOM");

        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines.len(), 3, "header plus one row per record");
        assert!(lines[0].contains("Parameters Count"));
        assert!(lines[1].contains("2026-03-14 09:26:53"));
        // The unpublished module renders an empty published_at cell
        assert!(lines[2].contains(",,") || lines[2].ends_with(','));
    }

    #[test]
    fn test_resolve_dot_path_and_missing() {
        let record = module_record(&sample_row("A", true));

        match resolve(&record, "created_by.username") {
            ExportValue::Text(s) => assert_eq!(s, "owner"),
            other => panic!("unexpected value: {:?}", other),
        }
        assert!(matches!(resolve(&record, "nonexistent"), ExportValue::Null));
        assert!(matches!(
            resolve(&record, "created_by.missing"),
            ExportValue::Null
        ));
    }

    #[test]
    fn test_composite_values_render_as_json() {
        let record = module_record(&sample_row("A", true));
        let rendered = render_text(resolve(&record, "tags"));
        assert_eq!(rendered, r#"["NLP","Vision"]"#);
    }

    #[test]
    fn test_xlsx_produces_workbook() {
        let records = vec![module_record(&sample_row("A", true))];
        let bytes = to_xlsx(&records, &default_module_fields()).unwrap();
        // XLSX is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_json_envelope() {
        let records = vec![module_record(&sample_row("A", true))];
        let envelope = to_json(&records);

        assert_eq!(envelope["count"], 1);
        assert_eq!(envelope["results"][0]["name"], "A");
        assert_eq!(envelope["results"][0]["created_by"]["username"], "owner");
        assert!(envelope["exported_at"].is_string());
    }
}

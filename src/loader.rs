//! CSV source loading.
//!
//! The loader reads the whole delimited export into an immutable [`Table`].
//! It is deliberately forgiving: heterogeneous export tools produce comma or
//! semicolon delimiters, UTF-8 or Latin-1 encodings, BOM-prefixed headers,
//! and the occasional unparseable cell. A bad cell nulls the attribute; only
//! a structurally broken file aborts the load.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::constants::loader::{DEFAULT_CHUNK_SIZE, PROGRESS_LOG_EVERY_CHUNKS};
use crate::data::{ColumnSet, FlowStatus, Record, Table};
use crate::errors::CoreError;
use crate::utils::{clean_text, normalize_header};

/// Known source columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Column {
    Flow,
    Service,
    Form,
    Step,
    FieldName,
    ChildFieldName,
    ChildCaption,
    CreatedAt,
    FlowStatus,
    Author,
}

/// Accepted header spellings, lowercase. Canonical snake_case names plus the
/// legacy Portuguese headers emitted by older export tools.
const HEADER_ALIASES: &[(&str, Column)] = &[
    ("flow_id", Column::Flow),
    ("fluxo", Column::Flow),
    ("service_id", Column::Service),
    ("servico", Column::Service),
    ("form_id", Column::Form),
    ("formulario", Column::Form),
    ("step_id", Column::Step),
    ("etapa", Column::Step),
    ("field_name", Column::FieldName),
    ("nomecampo", Column::FieldName),
    ("child_field_name", Column::ChildFieldName),
    ("nomecampofilho", Column::ChildFieldName),
    ("child_caption", Column::ChildCaption),
    ("legendafilho", Column::ChildCaption),
    ("created_at", Column::CreatedAt),
    ("datacriacao", Column::CreatedAt),
    ("flow_status", Column::FlowStatus),
    ("statusfluxo", Column::FlowStatus),
    ("author", Column::Author),
    ("autor", Column::Author),
];

/// Timestamp formats observed across export tools.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Loads the raw tabular source from disk.
pub struct CsvLoader {
    chunk_size: usize,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl CsvLoader {
    /// Create a loader that flushes parsed rows every `chunk_size` records.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Load the file at `path` into a table.
    ///
    /// Fails with [`CoreError::SourceUnavailable`] when the path is missing
    /// or unreadable and [`CoreError::Malformed`] when the delimited
    /// structure cannot be parsed. Callers (the store) degrade both to an
    /// empty table.
    pub fn load(&self, path: &Path) -> Result<Table, CoreError> {
        let path_display = path.display().to_string();
        let bytes = fs::read(path).map_err(|err| CoreError::SourceUnavailable {
            path: path_display.clone(),
            reason: err.to_string(),
        })?;
        let text = decode(&bytes);
        let text = text.trim_start_matches('\u{feff}');

        let delimiter = sniff_delimiter(text);
        debug!(
            path = %path_display,
            delimiter = %(delimiter as char),
            bytes = bytes.len(),
            "loading source file"
        );

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|err| CoreError::Malformed {
                path: path_display.clone(),
                details: err.to_string(),
            })?
            .clone();
        let (bindings, columns) = bind_headers(&headers);

        let mut rows: Vec<Record> = Vec::new();
        let mut chunk: Vec<Record> = Vec::with_capacity(self.chunk_size.min(8_192));
        let mut chunks_done = 0usize;
        let mut bad_cells = 0usize;
        for result in reader.records() {
            let record = result.map_err(|err| CoreError::Malformed {
                path: path_display.clone(),
                details: err.to_string(),
            })?;
            chunk.push(build_record(&record, &bindings, &mut bad_cells));
            if chunk.len() >= self.chunk_size {
                rows.append(&mut chunk);
                chunks_done += 1;
                if chunks_done % PROGRESS_LOG_EVERY_CHUNKS == 0 {
                    debug!(path = %path_display, rows = rows.len(), "load progress");
                }
            }
        }
        rows.append(&mut chunk);

        if bad_cells > 0 {
            warn!(path = %path_display, bad_cells, "nulled unparseable cells during load");
        }
        debug!(path = %path_display, rows = rows.len(), "source file loaded");
        Ok(Table::new(rows, columns))
    }
}

/// Decode UTF-8 strictly, falling back to Latin-1.
///
/// Latin-1 maps each byte to the code point of the same value, so the
/// fallback cannot fail; the loader therefore never rejects a file for its
/// encoding alone.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("source is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Semicolon-delimited exports carry `;` in the header line.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    if header.contains(';') {
        b';'
    } else {
        b','
    }
}

fn bind_headers(headers: &csv::StringRecord) -> (Vec<Option<Column>>, ColumnSet) {
    let mut bindings = Vec::with_capacity(headers.len());
    let mut columns = ColumnSet::default();
    for raw in headers.iter() {
        let name = normalize_header(raw).to_lowercase();
        let column = HEADER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, column)| *column);
        if let Some(column) = column {
            match column {
                Column::Flow => columns.flow = true,
                Column::Service => columns.service = true,
                Column::Form => columns.form = true,
                Column::Step => columns.step = true,
                Column::FieldName => columns.field_name = true,
                Column::ChildFieldName => columns.child_field_name = true,
                Column::ChildCaption => columns.child_caption = true,
                Column::CreatedAt => columns.created_at = true,
                Column::FlowStatus => columns.flow_status = true,
                Column::Author => columns.author = true,
            }
        }
        bindings.push(column);
    }
    (bindings, columns)
}

fn build_record(
    raw: &csv::StringRecord,
    bindings: &[Option<Column>],
    bad_cells: &mut usize,
) -> Record {
    let mut record = Record {
        flow_id: None,
        service_id: None,
        form_id: None,
        step_id: None,
        field_name: None,
        child_field_name: None,
        child_caption: None,
        created_at: None,
        flow_status: None,
        author: None,
        enriched: None,
    };
    for (idx, column) in bindings.iter().enumerate() {
        let Some(column) = column else { continue };
        let Some(cell) = raw.get(idx) else { continue };
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        match column {
            Column::Flow => record.flow_id = Some(cell.to_string()),
            Column::Service => record.service_id = Some(cell.to_string()),
            Column::Form => record.form_id = Some(cell.to_string()),
            Column::Step => record.step_id = Some(cell.to_string()),
            Column::FieldName => record.field_name = Some(cell.to_string()),
            Column::ChildFieldName => record.child_field_name = Some(cell.to_string()),
            Column::ChildCaption => record.child_caption = Some(clean_text(cell)),
            Column::CreatedAt => match parse_timestamp(cell) {
                Some(stamp) => record.created_at = Some(stamp),
                None => *bad_cells += 1,
            },
            Column::FlowStatus => match cell.parse::<i64>() {
                Ok(code) => record.flow_status = Some(FlowStatus::from_code(code)),
                Err(_) => *bad_cells += 1,
            },
            Column::Author => record.author = Some(cell.to_string()),
        }
    }
    record
}

/// Parse a timestamp cell across the formats the export tools use.
fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    for format in DATETIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(stamp.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cell, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fixture(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_comma_delimited_utf8_with_canonical_headers() {
        let fixture = write_fixture(
            "flow_id,service_id,form_id,field_name,created_at\n\
             A,S1,F1,TXT_NOME,2024-03-01 10:00:00\n\
             B,S2,F2,ZZZ_CUSTOM,2023-07-15\n",
        );
        let table = CsvLoader::default().load(fixture.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.columns().flow);
        assert!(table.columns().created_at);
        assert!(!table.columns().author);
        assert_eq!(table.rows()[0].flow_id.as_deref(), Some("A"));
        assert_eq!(table.rows()[0].created_at.unwrap().year(), 2024);
        assert_eq!(table.rows()[1].created_at.unwrap().year(), 2023);
        assert!(table.rows().iter().all(|r| r.enriched.is_none()));
    }

    #[test]
    fn sniffs_semicolon_delimiter_and_legacy_headers() {
        let fixture = write_fixture(
            "\u{feff}fluxo;servico;formulario;nomeCampo;dataCriacao;statusFluxo\n\
             A;S1;F1;CPF_NUM;01/02/2024;2\n",
        );
        let table = CsvLoader::default().load(fixture.path()).unwrap();
        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row.flow_id.as_deref(), Some("A"));
        assert_eq!(row.field_name.as_deref(), Some("CPF_NUM"));
        assert_eq!(row.created_at.unwrap().year(), 2024);
        assert_eq!(row.flow_status, Some(FlowStatus::Concluded));
    }

    #[test]
    fn falls_back_to_latin1_when_utf8_fails() {
        let mut file = NamedTempFile::new().unwrap();
        // "Ç" (0xC7) and "ã" (0xE3) as raw Latin-1 bytes.
        file.write_all(b"flow_id,field_name\nLicen\xC7a,TXT_NOME\nPadr\xE3o,CBO_TIPO\n")
            .unwrap();
        file.flush().unwrap();
        let table = CsvLoader::default().load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].flow_id.as_deref(), Some("LicenÇa"));
        assert_eq!(table.rows()[1].flow_id.as_deref(), Some("Padrão"));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let result = CsvLoader::default().load(Path::new("/nonexistent/dados.csv"));
        assert!(matches!(
            result,
            Err(CoreError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn unparseable_cells_null_the_attribute_but_keep_the_row() {
        let fixture = write_fixture(
            "flow_id,created_at,flow_status\n\
             A,not-a-date,abc\n\
             B,2024-01-01,4\n",
        );
        let table = CsvLoader::default().load(fixture.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows()[0].created_at.is_none());
        assert!(table.rows()[0].flow_status.is_none());
        assert_eq!(table.rows()[1].flow_status, Some(FlowStatus::Pending));
    }

    #[test]
    fn captions_are_mojibake_repaired_on_load() {
        let fixture = write_fixture(
            "flow_id,legendaFilho\nA,DescriÃ§Ã£o do campo\n",
        );
        let table = CsvLoader::default().load(fixture.path()).unwrap();
        assert_eq!(
            table.rows()[0].child_caption.as_deref(),
            Some("Descrição do campo")
        );
    }

    #[test]
    fn chunked_parse_preserves_row_order() {
        let mut content = String::from("flow_id,field_name\n");
        for idx in 0..25 {
            content.push_str(&format!("F{idx},TXT_{idx}\n"));
        }
        let fixture = write_fixture(&content);
        let table = CsvLoader::new(4).load(fixture.path()).unwrap();
        assert_eq!(table.len(), 25);
        assert_eq!(table.rows()[0].flow_id.as_deref(), Some("F0"));
        assert_eq!(table.rows()[24].flow_id.as_deref(), Some("F24"));
    }
}

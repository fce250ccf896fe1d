use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{
    Dataset, Record, COL_AGE_GROUP, COL_MARITAL_STATUS, COL_RACE, COL_SEX, COL_STATE,
    REQUIRED_COLUMNS,
};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the candidate microdata from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one column per field, integer codes as any int/float type
/// * `.json`    – `[{ "TP_SEXO": "F", "TP_COR_RACA": 3, ... }, ...]`
/// * `.csv`     – header row; `;` or `,` delimited (INEP ships `;`)
/// * `.xlsx`    – first worksheet, header row then one candidate per row
///
/// A missing column or a column of the wrong type aborts the load: no chart
/// can be drawn from such a file.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" | "txt" => load_csv(path),
        "xlsx" | "xlsm" | "xls" => load_xlsx(path),
        other => return Err(DashboardError::UnsupportedFormat(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    if dataset.is_empty() {
        log::warn!("{} holds no candidate rows", path.display());
    } else {
        log::info!("Loaded {} candidates from {}", dataset.len(), path.display());
    }
    Ok(dataset.with_source(path.to_path_buf()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "TP_SEXO": "F",
///     "TP_COR_RACA": 3,
///     "TP_ESTADO_CIVIL": 1,
///     "TP_FAIXA_ETARIA": 4,
///     "SG_UF_PROVA": "SP"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let field = |column: &'static str| -> Result<&JsonValue, DashboardError> {
            obj.get(column).ok_or(DashboardError::MissingColumn { column })
        };

        records.push(Record {
            sex_code: json_text(field(COL_SEX)?, i, COL_SEX)?,
            race_code: json_code(field(COL_RACE)?, i, COL_RACE)?,
            marital_status_code: json_code(field(COL_MARITAL_STATUS)?, i, COL_MARITAL_STATUS)?,
            age_group_code: json_code(field(COL_AGE_GROUP)?, i, COL_AGE_GROUP)?,
            state_code: json_text(field(COL_STATE)?, i, COL_STATE)?,
        });
    }

    Ok(Dataset::from_records(records))
}

fn json_text(val: &JsonValue, row: usize, column: &'static str) -> Result<String, DashboardError> {
    match val {
        JsonValue::String(s) => Ok(s.trim().to_string()),
        JsonValue::Null => Ok(String::new()),
        other => Err(DashboardError::InvalidValue {
            row,
            column,
            value: other.to_string(),
            expected: "a string",
        }),
    }
}

fn json_code(val: &JsonValue, row: usize, column: &'static str) -> Result<Option<i64>, DashboardError> {
    match val {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| invalid_code(row, column, n.to_string())),
        JsonValue::String(s) => parse_code(s, row, column),
        other => Err(invalid_code(row, column, other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one candidate per row.
/// Extra columns are ignored. Cells are read as bytes so Latin-1 files from
/// INEP load without transcoding; only ASCII codes are interpreted.
fn load_csv(path: &Path) -> Result<Dataset> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening CSV")?;

    let headers: Vec<String> = reader
        .byte_headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().trim_matches('"').to_string())
        .collect();

    let idx = |column: &'static str| -> Result<usize, DashboardError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or(DashboardError::MissingColumn { column })
    };
    let sex_idx = idx(COL_SEX)?;
    let race_idx = idx(COL_RACE)?;
    let marital_idx = idx(COL_MARITAL_STATUS)?;
    let age_idx = idx(COL_AGE_GROUP)?;
    let state_idx = idx(COL_STATE)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.byte_records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |i: usize| String::from_utf8_lossy(row.get(i).unwrap_or(b"")).trim().to_string();

        records.push(Record {
            sex_code: cell(sex_idx),
            race_code: parse_code(&cell(race_idx), row_no, COL_RACE)?,
            marital_status_code: parse_code(&cell(marital_idx), row_no, COL_MARITAL_STATUS)?,
            age_group_code: parse_code(&cell(age_idx), row_no, COL_AGE_GROUP)?,
            state_code: cell(state_idx),
        });
    }

    Ok(Dataset::from_records(records))
}

/// Pick `;` or `,` by counting them in the header line.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).context("opening CSV")?;
    let mut header = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut header)
        .context("reading CSV header line")?;
    let semicolons = header.iter().filter(|&&b| b == b';').count();
    let commas = header.iter().filter(|&&b| b == b',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Spreadsheet layout: the first worksheet, header row with column names,
/// then one candidate per row. Extra columns are ignored. Numeric cells go
/// through the same code parsing as CSV text.
fn load_xlsx(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| sheet_cell(Some(c))).collect())
        .unwrap_or_default();

    let idx = |column: &'static str| -> Result<usize, DashboardError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or(DashboardError::MissingColumn { column })
    };
    let sex_idx = idx(COL_SEX)?;
    let race_idx = idx(COL_RACE)?;
    let marital_idx = idx(COL_MARITAL_STATUS)?;
    let age_idx = idx(COL_AGE_GROUP)?;
    let state_idx = idx(COL_STATE)?;

    let mut records = Vec::with_capacity(range.height().saturating_sub(1));
    for (row_no, row) in rows.enumerate() {
        let cell = |i: usize| sheet_cell(row.get(i));
        records.push(Record {
            sex_code: cell(sex_idx),
            race_code: parse_code(&cell(race_idx), row_no, COL_RACE)?,
            marital_status_code: parse_code(&cell(marital_idx), row_no, COL_MARITAL_STATUS)?,
            age_group_code: parse_code(&cell(age_idx), row_no, COL_AGE_GROUP)?,
            state_code: cell(state_idx),
        });
    }

    Ok(Dataset::from_records(records))
}

/// Cell text as a CSV export would write it: `3.0` prints as `3`, empty
/// cells as the empty string.
fn sheet_cell(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(other) => format!("{other:?}"),
    }
}

/// Parse an integer code. Empty cells are missing values; `3.0` is accepted
/// because spreadsheet exports write codes of nullable columns as floats.
fn parse_code(s: &str, row: usize, column: &'static str) -> Result<Option<i64>, DashboardError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Some(i));
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
        _ => Err(invalid_code(row, column, s.to_string())),
    }
}

fn invalid_code(row: usize, column: &'static str, value: String) -> DashboardError {
    DashboardError::InvalidValue {
        row,
        column,
        value,
        expected: "an integer code",
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of candidate microdata.
///
/// Expected schema:
/// - `TP_SEXO`, `SG_UF_PROVA`: Utf8 or LargeUtf8
/// - `TP_COR_RACA`, `TP_ESTADO_CIVIL`, `TP_FAIXA_ETARIA`: any integer or
///   float type (Pandas writes nullable integer columns as float64)
/// - Any other columns are ignored
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    for column in REQUIRED_COLUMNS {
        if schema.index_of(column).is_err() {
            return Err(DashboardError::MissingColumn { column }.into());
        }
    }

    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let offset = records.len();
        let sex = text_column(&batch, COL_SEX)?;
        let race = code_column(&batch, COL_RACE, offset)?;
        let marital = code_column(&batch, COL_MARITAL_STATUS, offset)?;
        let age = code_column(&batch, COL_AGE_GROUP, offset)?;
        let state = text_column(&batch, COL_STATE)?;

        for row in 0..batch.num_rows() {
            records.push(Record {
                sex_code: sex[row].clone(),
                race_code: race[row],
                marital_status_code: marital[row],
                age_group_code: age[row],
                state_code: state[row].clone(),
            });
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, column: &'static str) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(column)
        .map_err(|_| DashboardError::MissingColumn { column })?;
    Ok(batch.column(idx))
}

/// Read a string column; nulls become empty strings.
fn text_column(batch: &RecordBatch, name: &'static str) -> Result<Vec<String>> {
    let col = column(batch, name)?;
    let as_utf8 = match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => cast(col.as_ref(), &DataType::Utf8)
            .with_context(|| format!("casting '{name}' to Utf8"))?,
        other => {
            return Err(DashboardError::WrongColumnType {
                column: name,
                expected: "a string type",
                found: format!("{other:?}"),
            }
            .into())
        }
    };
    Ok(as_utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.unwrap_or("").trim().to_string())
        .collect())
}

/// Read an integer code column; nulls become `None`. Float columns must hold
/// whole numbers (or NaN, read as missing). `offset` is the file row of the
/// batch's first row, for error messages.
fn code_column(batch: &RecordBatch, name: &'static str, offset: usize) -> Result<Vec<Option<i64>>> {
    let col = column(batch, name)?;
    let dt = col.data_type();
    if dt.is_integer() {
        let as_i64 = cast(col.as_ref(), &DataType::Int64)
            .with_context(|| format!("casting '{name}' to Int64"))?;
        return Ok(as_i64.as_primitive::<Int64Type>().iter().collect());
    }
    if !dt.is_floating() {
        return Err(DashboardError::WrongColumnType {
            column: name,
            expected: "an integer or float type",
            found: format!("{dt:?}"),
        }
        .into());
    }

    let as_f64 = cast(col.as_ref(), &DataType::Float64)
        .with_context(|| format!("casting '{name}' to Float64"))?;
    let codes = as_f64
        .as_primitive::<Float64Type>()
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            None => Ok(None),
            Some(f) if f.is_nan() => Ok(None),
            Some(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
            Some(f) => Err(invalid_code(offset + i, name, f.to_string())),
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_semicolon_csv_with_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "enem.csv",
            "NU_INSCRICAO;TP_FAIXA_ETARIA;TP_SEXO;TP_ESTADO_CIVIL;TP_COR_RACA;SG_UF_PROVA\n\
             1;3;F;1;3;SP\n\
             2;11;M;;1;BA\n",
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0], Record::new("F", Some(3), Some(1), Some(3), "SP"));
        assert_eq!(ds.records()[1].marital_status_code, None);
        assert_eq!(ds.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn loads_comma_csv() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "enem.csv",
            "TP_SEXO,TP_COR_RACA,TP_ESTADO_CIVIL,TP_FAIXA_ETARIA,SG_UF_PROVA\nM,2,1,5.0,RJ\n",
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0], Record::new("M", Some(2), Some(1), Some(5), "RJ"));
    }

    #[test]
    fn csv_missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "enem.csv", "TP_SEXO;TP_COR_RACA;SG_UF_PROVA\nF;1;SP\n");
        let err = load_file(&path).unwrap_err();
        let cause = err.downcast_ref::<DashboardError>().unwrap();
        assert!(matches!(cause, DashboardError::MissingColumn { column } if *column == COL_MARITAL_STATUS));
    }

    #[test]
    fn csv_non_numeric_code_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "enem.csv",
            "TP_SEXO;TP_COR_RACA;TP_ESTADO_CIVIL;TP_FAIXA_ETARIA;SG_UF_PROVA\nF;parda;1;3;SP\n",
        );
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("TP_COR_RACA"));
    }

    #[test]
    fn loads_json_records() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "enem.json",
            r#"[{"TP_SEXO":"F","TP_COR_RACA":3,"TP_ESTADO_CIVIL":null,"TP_FAIXA_ETARIA":4.0,"SG_UF_PROVA":"PE"}]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0], Record::new("F", Some(3), None, Some(4), "PE"));
    }

    #[test]
    fn json_missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "enem.json", r#"[{"TP_SEXO":"F"}]"#);
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("dados.sav")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::UnsupportedFormat(ext)) if ext == "sav"
        ));
    }

    #[test]
    fn header_only_csv_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "enem.csv",
            "TP_SEXO;TP_COR_RACA;TP_ESTADO_CIVIL;TP_FAIXA_ETARIA;SG_UF_PROVA\n",
        );
        let ds = load_file(&path).unwrap();
        assert!(ds.is_empty());
    }

    /// Writes a sheet the way `df.to_excel` does: header row, numbers as floats.
    fn write_xlsx(path: &Path, header: &[&str], rows: &[[Option<&str>; 5]]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                let (r, col) = (r as u32 + 1, col as u16);
                match cell {
                    None => {}
                    Some(v) => match v.parse::<f64>() {
                        Ok(n) => sheet.write_number(r, col, n).map(|_| ()).unwrap(),
                        Err(_) => sheet.write_string(r, col, *v).map(|_| ()).unwrap(),
                    },
                }
            }
        }
        workbook.save(path).unwrap();
    }

    const XLSX_HEADER: [&str; 5] = [COL_AGE_GROUP, COL_SEX, COL_MARITAL_STATUS, COL_RACE, COL_STATE];

    #[test]
    fn loads_xlsx_by_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ENEMDados2023.xlsx");
        write_xlsx(
            &path,
            &XLSX_HEADER,
            &[
                [Some("3"), Some("F"), Some("1"), Some("3"), Some("SP")],
                [Some("11"), Some("M"), None, Some("1"), Some("BA")],
            ],
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(
            ds.records(),
            &[
                Record::new("F", Some(3), Some(1), Some(3), "SP"),
                Record::new("M", Some(1), None, Some(11), "BA"),
            ]
        );
    }

    #[test]
    fn xlsx_fractional_code_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enem.xlsx");
        write_xlsx(
            &path,
            &XLSX_HEADER,
            &[[Some("3"), Some("F"), Some("1"), Some("3.7"), Some("SP")]],
        );

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::InvalidValue { row: 0, column, .. }) if *column == COL_RACE
        ));
    }

    #[test]
    fn xlsx_missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enem.xlsx");
        write_xlsx(
            &path,
            &[COL_SEX, COL_RACE, COL_STATE, "NU_NOTA_MT", "NU_NOTA_CN"],
            &[[Some("F"), Some("1"), Some("SP"), Some("500"), Some("600")]],
        );

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::MissingColumn { column }) if *column == COL_MARITAL_STATUS
        ));
    }

    fn write_parquet(path: &Path, race: Arc<dyn Array>) {
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_SEX, DataType::Utf8, true),
            Field::new(COL_RACE, race.data_type().clone(), true),
            Field::new(COL_MARITAL_STATUS, DataType::Int32, true),
            Field::new(COL_AGE_GROUP, DataType::Float64, true),
            Field::new(COL_STATE, DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["F", "M"])),
                race,
                Arc::new(Int32Array::from(vec![Some(1), None])),
                Arc::new(Float64Array::from(vec![3.0, 20.0])),
                Arc::new(StringArray::from(vec![Some("SP"), None])),
            ],
        )
        .unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn loads_parquet_with_mixed_numeric_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enem.parquet");
        write_parquet(&path, Arc::new(Int32Array::from(vec![3, 1])));

        let ds = load_file(&path).unwrap();
        assert_eq!(
            ds.records(),
            &[
                Record::new("F", Some(3), Some(1), Some(3), "SP"),
                Record::new("M", Some(1), None, Some(20), ""),
            ]
        );
    }

    #[test]
    fn parquet_string_code_column_is_wrong_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enem.parquet");
        write_parquet(&path, Arc::new(StringArray::from(vec!["3", "1"])));

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::WrongColumnType { column, .. }) if *column == COL_RACE
        ));
    }

    #[test]
    fn parquet_fractional_code_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enem.parquet");
        write_parquet(&path, Arc::new(Float64Array::from(vec![1.0, 3.7])));

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::InvalidValue { row: 1, column, value, .. })
                if *column == COL_RACE && value == "3.7"
        ));
    }

    #[test]
    fn parquet_nan_code_is_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enem.parquet");
        write_parquet(&path, Arc::new(Float64Array::from(vec![f64::NAN, 2.0])));

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0].race_code, None);
        assert_eq!(ds.records()[1].race_code, Some(2));
    }
}

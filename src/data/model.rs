use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Source columns
// ---------------------------------------------------------------------------

/// Column names of the ENEM microdata. These are fixed by the data provider.
pub const COL_SEX: &str = "TP_SEXO";
pub const COL_RACE: &str = "TP_COR_RACA";
pub const COL_MARITAL_STATUS: &str = "TP_ESTADO_CIVIL";
pub const COL_AGE_GROUP: &str = "TP_FAIXA_ETARIA";
pub const COL_STATE: &str = "SG_UF_PROVA";

/// All columns a dataset must provide, in the order they are reported.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_SEX,
    COL_RACE,
    COL_MARITAL_STATUS,
    COL_AGE_GROUP,
    COL_STATE,
];

// ---------------------------------------------------------------------------
// Record – one candidate row
// ---------------------------------------------------------------------------

/// One candidate (one row of the microdata file).
///
/// Codes are kept exactly as they appear in the source; translating them into
/// labels is the job of [`super::category`]. Integer codes are `None` when the
/// cell was empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// `M` or `F`.
    pub sex_code: String,
    /// Race/color, 0–6.
    pub race_code: Option<i64>,
    /// Marital status, 0–4.
    pub marital_status_code: Option<i64>,
    /// Ordinal age bucket, 1–20.
    pub age_group_code: Option<i64>,
    /// Two-letter code of the state where the test was taken.
    pub state_code: String,
}

impl Record {
    pub fn new(
        sex_code: impl Into<String>,
        race_code: Option<i64>,
        marital_status_code: Option<i64>,
        age_group_code: Option<i64>,
        state_code: impl Into<String>,
    ) -> Self {
        Record {
            sex_code: sex_code.into(),
            race_code,
            marital_status_code,
            age_group_code,
            state_code: state_code.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded file
// ---------------------------------------------------------------------------

/// The full parsed dataset. Read-only once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    /// File the records came from, if any.
    pub source: Option<PathBuf>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Dataset {
            records,
            source: None,
        }
    }

    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

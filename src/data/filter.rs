use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::category::{sex_label, SEX_FEMALE, SEX_MALE};
use super::model::{Dataset, Record};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// SexFilter – the single cross-cutting selection
// ---------------------------------------------------------------------------

/// Which candidates the filtered charts are computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SexFilter {
    #[default]
    All,
    Male,
    Female,
}

impl SexFilter {
    pub const ALL: [SexFilter; 3] = [SexFilter::All, SexFilter::Male, SexFilter::Female];

    /// Name shown in the selector and in chart titles.
    pub fn display_name(self) -> &'static str {
        match self {
            SexFilter::All => "Todos",
            SexFilter::Male => SEX_MALE,
            SexFilter::Female => SEX_FEMALE,
        }
    }

    /// Whether `record` passes this filter.
    ///
    /// Matching goes through the sex label, so a record with an unmapped sex
    /// code is only ever selected by [`SexFilter::All`].
    pub fn matches(self, record: &Record) -> bool {
        match self {
            SexFilter::All => true,
            SexFilter::Male => sex_label(&record.sex_code) == SEX_MALE,
            SexFilter::Female => sex_label(&record.sex_code) == SEX_FEMALE,
        }
    }
}

impl fmt::Display for SexFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SexFilter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todos" | "all" => Ok(SexFilter::All),
            "masculino" | "male" | "m" => Ok(SexFilter::Male),
            "feminino" | "female" | "f" => Ok(SexFilter::Female),
            _ => Err(DashboardError::InvalidFilter(s.to_string())),
        }
    }
}

/// Iterate over the records of `dataset` that pass `filter`.
pub fn filtered_records(
    dataset: &Dataset,
    filter: SexFilter,
) -> impl Iterator<Item = &Record> + '_ {
    dataset.records().iter().filter(move |r| filter.matches(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            Record::new("F", Some(1), Some(1), Some(3), "SP"),
            Record::new("M", Some(2), Some(1), Some(4), "RJ"),
            Record::new("F", Some(3), Some(2), Some(12), "SP"),
            Record::new("?", Some(3), Some(2), Some(12), "MG"),
        ])
    }

    #[test]
    fn all_selects_every_record() {
        assert_eq!(filtered_records(&sample(), SexFilter::All).count(), 4);
    }

    #[test]
    fn male_and_female_partition_known_codes() {
        let ds = sample();
        assert_eq!(filtered_records(&ds, SexFilter::Male).count(), 1);
        assert_eq!(filtered_records(&ds, SexFilter::Female).count(), 2);
    }

    #[test]
    fn parses_portuguese_and_english_names() {
        assert_eq!("Todos".parse::<SexFilter>().unwrap(), SexFilter::All);
        assert_eq!("masculino".parse::<SexFilter>().unwrap(), SexFilter::Male);
        assert_eq!("FEMALE".parse::<SexFilter>().unwrap(), SexFilter::Female);
        assert_eq!("f".parse::<SexFilter>().unwrap(), SexFilter::Female);
        assert!("outro".parse::<SexFilter>().is_err());
    }

    #[test]
    fn default_is_all() {
        assert_eq!(SexFilter::default(), SexFilter::All);
        assert_eq!(SexFilter::All.to_string(), "Todos");
    }
}

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use super::model::Record;

// ---------------------------------------------------------------------------
// Dimension – a categorical column used for grouping
// ---------------------------------------------------------------------------

/// A categorical dimension the aggregator can group by.
///
/// The state of test application is not a labelled dimension: it is grouped
/// by raw code in [`super::aggregate::aggregate_by_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Sex,
    Race,
    MaritalStatus,
    AgeBracket,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Sex,
        Dimension::Race,
        Dimension::MaritalStatus,
        Dimension::AgeBracket,
    ];

    /// Human readable column header, as shown on chart axes.
    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::Sex => "Sexo",
            Dimension::Race => "Cor/Raça",
            Dimension::MaritalStatus => "Estado Civil",
            Dimension::AgeBracket => "Faixa Etária",
        }
    }

    /// Label of `record` along this dimension.
    pub fn label_of(self, record: &Record) -> &'static str {
        match self {
            Dimension::Sex => sex_label(&record.sex_code),
            Dimension::Race => race_label(record.race_code),
            Dimension::MaritalStatus => marital_status_label(record.marital_status_code),
            Dimension::AgeBracket => age_bracket_label(record.age_group_code),
        }
    }

    /// Whether `label` is the fallback for codes outside the known domain.
    pub fn is_fallback(self, label: &str) -> bool {
        match self {
            Dimension::AgeBracket => label == AGE_BRACKET_FALLBACK,
            _ => label == UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Label tables
// ---------------------------------------------------------------------------

/// Label for sex, race and marital status codes outside their tables
/// (including empty cells).
pub const UNKNOWN_LABEL: &str = "Não informado (código desconhecido)";

pub const SEX_MALE: &str = "Masculino";
pub const SEX_FEMALE: &str = "Feminino";

const SEX_LABELS: [(&str, &str); 2] = [("M", SEX_MALE), ("F", SEX_FEMALE)];

pub const RACE_LABELS: [(i64, &str); 7] = [
    (0, "Não declarado"),
    (1, "Branca"),
    (2, "Preta"),
    (3, "Parda"),
    (4, "Amarela"),
    (5, "Indígena"),
    (6, "Não dispõe de informação"),
];

pub const MARITAL_STATUS_LABELS: [(i64, &str); 5] = [
    (0, "Não informado"),
    (1, "Solteiro(a)"),
    (2, "Casado(a)/Mora com companheiro(a)"),
    (3, "Divorciado(a)/Desquitado(a)/Separado(a)"),
    (4, "Viúvo(a)"),
];

/// Age brackets, youngest first. Checked in order; the first range that
/// contains the code wins.
pub const AGE_BRACKETS: [(RangeInclusive<i64>, &str); 9] = [
    (1..=2, "Menor de 18 anos"),
    (3..=6, "Entre 18 e 21 anos"),
    (7..=10, "Entre 22 e 25 anos"),
    (11..=11, "Entre 26 e 30 anos"),
    (12..=13, "Entre 31 e 40 anos"),
    (14..=15, "Entre 41 e 50 anos"),
    (16..=17, "Entre 51 e 60 anos"),
    (18..=19, "Entre 61 e 70 anos"),
    (20..=20, "Maior de 70 anos"),
];

/// Bracket for codes outside every range. Sorted after all real brackets.
pub const AGE_BRACKET_FALLBACK: &str = "Outros";

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub fn sex_label(code: &str) -> &'static str {
    let code = code.trim();
    SEX_LABELS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_LABEL)
}

pub fn race_label(code: Option<i64>) -> &'static str {
    lookup(&RACE_LABELS, code)
}

pub fn marital_status_label(code: Option<i64>) -> &'static str {
    lookup(&MARITAL_STATUS_LABELS, code)
}

pub fn age_bracket_label(code: Option<i64>) -> &'static str {
    code.and_then(|c| {
        AGE_BRACKETS
            .iter()
            .find(|(range, _)| range.contains(&c))
            .map(|(_, label)| *label)
    })
    .unwrap_or(AGE_BRACKET_FALLBACK)
}

/// Position of an age bracket label in the fixed youngest-to-oldest order.
/// The fallback bracket (and anything unknown) sorts last.
pub fn age_bracket_rank(label: &str) -> usize {
    AGE_BRACKETS
        .iter()
        .position(|(_, l)| *l == label)
        .unwrap_or(AGE_BRACKETS.len())
}

fn lookup(table: &[(i64, &'static str)], code: Option<i64>) -> &'static str {
    code.and_then(|c| table.iter().find(|(k, _)| *k == c))
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_codes_map_to_portuguese_labels() {
        assert_eq!(sex_label("M"), "Masculino");
        assert_eq!(sex_label("F"), "Feminino");
        assert_eq!(sex_label(" f "), "Feminino");
        assert_eq!(sex_label("X"), UNKNOWN_LABEL);
        assert_eq!(sex_label(""), UNKNOWN_LABEL);
    }

    #[test]
    fn race_table_has_both_undeclared_sentinels() {
        assert_eq!(race_label(Some(0)), "Não declarado");
        assert_eq!(race_label(Some(3)), "Parda");
        assert_eq!(race_label(Some(6)), "Não dispõe de informação");
        assert_eq!(race_label(Some(7)), UNKNOWN_LABEL);
        assert_eq!(race_label(None), UNKNOWN_LABEL);
    }

    #[test]
    fn marital_status_lookup() {
        assert_eq!(marital_status_label(Some(1)), "Solteiro(a)");
        assert_eq!(marital_status_label(Some(4)), "Viúvo(a)");
        assert_eq!(marital_status_label(Some(-1)), UNKNOWN_LABEL);
    }

    #[test]
    fn age_bracket_ranges() {
        let expected = [
            (1, "Menor de 18 anos"),
            (2, "Menor de 18 anos"),
            (3, "Entre 18 e 21 anos"),
            (6, "Entre 18 e 21 anos"),
            (7, "Entre 22 e 25 anos"),
            (10, "Entre 22 e 25 anos"),
            (11, "Entre 26 e 30 anos"),
            (12, "Entre 31 e 40 anos"),
            (13, "Entre 31 e 40 anos"),
            (15, "Entre 41 e 50 anos"),
            (16, "Entre 51 e 60 anos"),
            (19, "Entre 61 e 70 anos"),
            (20, "Maior de 70 anos"),
        ];
        for (code, label) in expected {
            assert_eq!(age_bracket_label(Some(code)), label, "code {code}");
        }
    }

    #[test]
    fn age_bracket_out_of_range_falls_back() {
        assert_eq!(age_bracket_label(Some(0)), AGE_BRACKET_FALLBACK);
        assert_eq!(age_bracket_label(Some(21)), AGE_BRACKET_FALLBACK);
        assert_eq!(age_bracket_label(None), AGE_BRACKET_FALLBACK);
    }

    #[test]
    fn age_bracket_ranks_follow_table_order() {
        assert_eq!(age_bracket_rank("Menor de 18 anos"), 0);
        assert_eq!(age_bracket_rank("Maior de 70 anos"), 8);
        assert_eq!(age_bracket_rank(AGE_BRACKET_FALLBACK), 9);
    }

    #[test]
    fn dimension_dispatches_to_record_fields() {
        let r = Record::new("F", Some(1), Some(2), Some(11), "SP");
        assert_eq!(Dimension::Sex.label_of(&r), "Feminino");
        assert_eq!(Dimension::Race.label_of(&r), "Branca");
        assert_eq!(
            Dimension::MaritalStatus.label_of(&r),
            "Casado(a)/Mora com companheiro(a)"
        );
        assert_eq!(Dimension::AgeBracket.label_of(&r), "Entre 26 e 30 anos");
    }
}

use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Index drawn with probability proportional to `weights`.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut r = self.next_f64() * total;
        for (i, &w) in weights.iter().enumerate() {
            if r < w {
                return i;
            }
            r -= w;
        }
        weights.len() - 1
    }
}

// Rough shares of the 2023 edition, enough to make the charts look familiar.
const SEX: [(&str, f64); 2] = [("F", 0.61), ("M", 0.39)];
const RACE: [(i64, f64); 7] = [
    (0, 0.02),
    (1, 0.39),
    (2, 0.13),
    (3, 0.43),
    (4, 0.02),
    (5, 0.005),
    (6, 0.005),
];
const MARITAL_STATUS: [(i64, f64); 5] = [(0, 0.04), (1, 0.89), (2, 0.05), (3, 0.015), (4, 0.005)];
const STATES: [(&str, f64); 27] = [
    ("SP", 0.17), ("MG", 0.10), ("BA", 0.08), ("RJ", 0.07), ("PE", 0.06), ("CE", 0.06),
    ("PA", 0.05), ("MA", 0.04), ("PR", 0.04), ("RS", 0.04), ("GO", 0.03), ("PB", 0.03),
    ("AM", 0.03), ("PI", 0.025), ("RN", 0.02), ("AL", 0.02), ("SC", 0.02), ("ES", 0.02),
    ("DF", 0.02), ("MT", 0.015), ("SE", 0.012), ("MS", 0.012), ("TO", 0.008), ("RO", 0.008),
    ("AP", 0.005), ("AC", 0.005), ("RR", 0.004),
];

/// Age bucket weights for codes 1..=20, peaking at 17–19 years old.
fn age_weights() -> Vec<f64> {
    (1..=20)
        .map(|code: i64| match code {
            1 => 0.03,
            2 => 0.18,
            3 => 0.22,
            4 => 0.12,
            5..=6 => 0.06,
            7..=10 => 0.03,
            11 => 0.05,
            12..=13 => 0.03,
            14..=15 => 0.015,
            16..=17 => 0.006,
            18..=19 => 0.002,
            _ => 0.001,
        })
        .collect()
}

fn main() {
    let mut args = std::env::args().skip(1);
    let rows: usize = args
        .next()
        .map(|s| s.parse().expect("row count must be a positive integer"))
        .unwrap_or(20_000);
    let output_path = args.next().unwrap_or_else(|| "sample_enem.parquet".to_string());

    let mut rng = SimpleRng::new(2023);
    let sex_w: Vec<f64> = SEX.iter().map(|(_, w)| *w).collect();
    let race_w: Vec<f64> = RACE.iter().map(|(_, w)| *w).collect();
    let marital_w: Vec<f64> = MARITAL_STATUS.iter().map(|(_, w)| *w).collect();
    let state_w: Vec<f64> = STATES.iter().map(|(_, w)| *w).collect();
    let age_w = age_weights();

    let mut sex = Vec::with_capacity(rows);
    let mut race = Vec::with_capacity(rows);
    let mut marital = Vec::with_capacity(rows);
    let mut age = Vec::with_capacity(rows);
    let mut state = Vec::with_capacity(rows);

    for _ in 0..rows {
        sex.push(SEX[rng.weighted(&sex_w)].0);
        race.push(RACE[rng.weighted(&race_w)].0);
        marital.push(MARITAL_STATUS[rng.weighted(&marital_w)].0);
        age.push(rng.weighted(&age_w) as i64 + 1);
        state.push(STATES[rng.weighted(&state_w)].0);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("TP_FAIXA_ETARIA", DataType::Int64, false),
        Field::new("TP_SEXO", DataType::Utf8, false),
        Field::new("TP_ESTADO_CIVIL", DataType::Int64, false),
        Field::new("TP_COR_RACA", DataType::Int64, false),
        Field::new("SG_UF_PROVA", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(age)),
            Arc::new(StringArray::from(sex)),
            Arc::new(Int64Array::from(marital)),
            Arc::new(Int64Array::from(race)),
            Arc::new(StringArray::from(state)),
        ],
    )
    .expect("Failed to create RecordBatch");

    if output_path.ends_with(".csv") {
        let file = std::fs::File::create(&output_path).expect("Failed to create output file");
        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
        writer
            .write_record(schema.fields().iter().map(|f| f.name().as_str()))
            .expect("Failed to write header");
        for row in 0..batch.num_rows() {
            let cells: Vec<String> = batch
                .columns()
                .iter()
                .map(|col| {
                    arrow::util::display::array_value_to_string(col, row)
                        .expect("Failed to format cell")
                })
                .collect();
            writer.write_record(&cells).expect("Failed to write row");
        }
        writer.flush().expect("Failed to flush CSV");
    } else {
        let file = std::fs::File::create(&output_path).expect("Failed to create output file");
        let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
        writer.write(&batch).expect("Failed to write batch");
        writer.close().expect("Failed to close writer");
    }

    println!("Wrote {rows} candidates to {output_path}");
}

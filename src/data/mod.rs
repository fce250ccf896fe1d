/// Data layer: core types, loading, labelling, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (schema checked)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, read-only, shared via Arc
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │ ───▶ │ aggregate │  label via category → FrequencyTable
///   └──────────┘      └──────────┘
/// ```

pub mod aggregate;
pub mod category;
pub mod filter;
pub mod loader;
pub mod model;

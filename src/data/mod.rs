/// Data layer: schema, loading, filtering, aggregation, export.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable → Dataset (schema checked once)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    filter     │  ordered stages, each narrowing the previous rows
///   └──────────────┘
///        │  FilteredView (row indices, dataset order)
///        ▼
///   ┌──────────────┐
///   │  aggregate    │  summary, group-by, top-N, cross-tab, vocabulary
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  derived tables → CSV
///   └──────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;

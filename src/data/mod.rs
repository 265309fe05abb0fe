/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///     visit-log .csv
///          │
///          ▼
///     ┌──────────┐
///     │  loader   │  normalize header → validate → coerce batches
///     └──────────┘
///          │
///          ▼
///     ┌──────────┐
///     │ Dataset   │  Vec<VisitRecord>, input order, immutable
///     └──────────┘
///          │
///          ▼
///     ┌──────────┐
///     │  filter   │  apply criteria → View (filtered indices) → pages
///     └──────────┘
///          │
///          ▼
///     ┌──────────┐
///     │ summary   │  totals, top-N rankings, per-day series
///     └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;

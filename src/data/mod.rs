/// Data layer: table model, loading, column resolution and row selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → HazardTable
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ HazardTable  │  header + rows of CellValue
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  (poe, imt) → filtered HazardTable
///   └──────────┘
///        │
///        ▼
///   hazard::disagg / hazard::spectrum / hazard::curve
/// ```

pub mod columns;
pub mod filter;
pub mod loader;
pub mod model;

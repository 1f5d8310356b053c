/// Source adapters: turn raw USGS / metric-table text into domain types.
///
/// Submodules:
/// - `daily_values` - daily discharge tokenizer + series loader (cleaning).
/// - `metrics`      - annual / monthly metric tables (CSV).
/// - `peak_flow`    - USGS annual peak streamflow file (RDB).
/// - `fixtures`     - (test only) representative payloads.

pub mod daily_values;
pub mod metrics;
pub mod peak_flow;

#[cfg(test)]
pub(crate) mod fixtures;

/// flow_climatology: daily streamflow cleaning, monthly climatology and
/// annual-peak return periods for USGS gauging stations.
///
/// # Module structure
///
/// ```text
/// flow_climatology
/// ├── model       - shared data types (Observation, MetricRow, HydroError, …)
/// ├── config      - run configuration loader (flowclim.toml)
/// ├── logging     - leveled, stage-tagged console/file logging
/// ├── ingest
/// │   ├── daily_values - daily-value tokenizer + series loader (cleaning)
/// │   ├── metrics      - annual / monthly metric tables (CSV)
/// │   ├── peak_flow    - USGS peak streamflow file (RDB)
/// │   └── fixtures (test only) - representative payloads
/// ├── analysis
/// │   ├── clip          - inclusive date-window clipping
/// │   ├── climatology   - water-year blocks → calendar-month means
/// │   ├── return_period - Weibull exceedance curve
/// │   └── stats         - missing-aware mean, series summary
/// └── pipeline    - one-station pipeline + thread-pool runner
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;

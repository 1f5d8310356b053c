/// Analysis of cleaned streamflow data.
///
/// Submodules:
/// - `clip`          - restricts a daily series to an inclusive date window.
/// - `climatology`   - average annual monthly values (water-year blocks → calendar months).
/// - `return_period` - Weibull exceedance probabilities for annual peaks.
/// - `stats`         - missing-aware mean and series summary.

pub mod climatology;
pub mod clip;
pub mod return_period;
pub mod stats;

/// Test fixtures: trimmed copies of the files the pipeline reads.
///
/// - Daily values: USGS NWIS DV "rdb" export for Wildcat Creek (03335000),
///   tab-delimited, with the usual `#` header block, a column-name line and
///   a column-format line before the data.
/// - Metric tables: the comma-delimited annual metric file produced by the
///   descriptive-statistics step, several stations interleaved.
/// - Peak flow: USGS peak streamflow "rdb" export.

/// Ten data-looking lines for Wildcat Creek. After loading:
///   - 3 malformed (column-name line, format line, month 13)
///   - 1 gross error (2014-10-03, -5.0)
///   - 1 duplicate (second 2014-10-06, 99.0)
///   - 7 observations, 2 missing (2014-10-02 `Eqp`, 2014-10-04 blank)
#[cfg(test)]
pub(crate) fn fixture_wildcat_daily_rdb() -> &'static str {
    "# ---------------------------------- WARNING ----------------------------------------
# Some of the data that you have obtained from this U.S. Geological Survey database
# may not have received Director's approval.
#
# Data for the following 1 site(s) are contained in this file
#    USGS 03335000 WILDCAT CREEK NEAR LAFAYETTE, IN
# -----------------------------------------------------------------------------------
#
#    TS_ID       Parameter     Statistic     Description
#    104933      00060         00003         Discharge, cubic feet per second (Mean)
#
agency_cd\tsite_no\tdatetime\t104933_00060_00003\t104933_00060_00003_cd
5s\t15s\t20d\t14n\t10s
USGS\t03335000\t2014-09-29\t41.2\tA
USGS\t03335000\t2014-09-30\t40.0\tA
USGS\t03335000\t2014-10-01\t38.5\tA
USGS\t03335000\t2014-10-02\tEqp\tA
USGS\t03335000\t2014-10-03\t-5.0\tA
USGS\t03335000\t2014-10-04\t\tP
USGS\t03335000\t2014-10-06\t52.0\tP
USGS\t03335000\t2014-10-05\t47.1\tP:e
USGS\t03335000\t2014-10-06\t99.0\tP
USGS\t03335000\t2014-13-01\t10.0\tP
"
}

/// Annual metric table, two stations. Wildcat 2016 has a blank `Coeff Var`,
/// Tippe 2016 has a non-numeric one.
#[cfg(test)]
pub(crate) fn fixture_annual_metrics_csv() -> &'static str {
    "Date,site_no,Mean Flow,Peak Flow,Median Flow,Coeff Var,Skew,Tqmean,R-B index,7Q,3xMedian,Station
2015-09-30,3335000,120.5,1500,80,110.2,2.1,0.25,0.31,5.0,240,Wildcat
2016-09-30,3335000,98.1,2100,60,,2.3,0.22,0.29,4.0,180,Wildcat
2017-09-30,3335000,140.0,1800,85,105.0,1.9,0.27,0.33,6.0,255,Wildcat
2015-09-30,3331500,600.0,5200,400,90.0,1.5,0.30,0.12,90,1200,Tippe
2016-09-30,3331500,550.0,4800,380,n/a,1.4,0.31,0.11,85,1140,Tippe
"
}

/// Peak streamflow file for Wildcat Creek. The 1913 row uses the USGS
/// "unknown day" convention (`00`) and cannot be placed on a date; the
/// 2013 row has no discharge.
#[cfg(test)]
pub(crate) fn fixture_wildcat_peak_rdb() -> &'static str {
    "#
# U.S. Geological Survey
# National Water Information System
#
# This file contains the annual peak streamflow data.
#
agency_cd\tsite_no\tpeak_dt\tpeak_tm\tpeak_va\tpeak_cd\tgage_ht\tgage_ht_cd\tyear_last_pk\tag_dt\tag_tm\tag_gage_ht\tag_gage_ht_cd
5s\t15s\t10d\t6s\t8s\t33s\t8s\t27s\t4s\t10d\t6s\t8s\t27s
USGS\t03335000\t1913-03-00\t\t35000\t7\t\t\t\t\t\t\t
USGS\t03335000\t1955-02-28\t\t9050\t\t12.40\t\t\t\t\t\t
USGS\t03335000\t1956-04-01\t09:15\t7210\t\t10.95\t\t\t\t\t\t
USGS\t03335000\t2013-04-19\t\t\t\t15.70\t\t\t\t\t\t
USGS\t03335000\t2019-01-01\t\t15600\t2,5\t14.23\t\t\t\t\t\t
"
}

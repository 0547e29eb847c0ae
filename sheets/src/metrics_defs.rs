//! Metrics definitions for the spreadsheet client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SHEETS_APPEND_DURATION: MetricDef = MetricDef {
    name: "sheets.append.duration",
    metric_type: MetricType::Histogram,
    description: "Time to authenticate, resolve the sheet and append one row, in seconds. Tagged with sheet.",
};

pub const SHEETS_APPEND_FAILURES: MetricDef = MetricDef {
    name: "sheets.append.failures",
    metric_type: MetricType::Counter,
    description: "Number of rows that could not be appended. Tagged with sheet.",
};

pub const ALL_METRICS: &[MetricDef] = &[SHEETS_APPEND_DURATION, SHEETS_APPEND_FAILURES];

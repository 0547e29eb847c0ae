use shared::metrics_defs::{MetricDef, MetricType};

pub const BEACON_REQUESTS: MetricDef = MetricDef {
    name: "beacon.requests",
    metric_type: MetricType::Counter,
    description: "Pixel requests handled. Tagged with outcome.",
};

pub const FORM_REQUESTS: MetricDef = MetricDef {
    name: "form.requests",
    metric_type: MetricType::Counter,
    description: "Form submissions handled. Tagged with outcome.",
};

pub const ALL_METRICS: &[MetricDef] = &[BEACON_REQUESTS, FORM_REQUESTS];

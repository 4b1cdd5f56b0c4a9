//! Metrics definitions for the aggregator.

use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSTREAM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "upstream.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch and decode one upstream response in seconds",
};

pub const UPSTREAM_REQUEST_FAILURE: MetricDef = MetricDef {
    name: "upstream.request.failure",
    metric_type: MetricType::Counter,
    description: "Number of upstream requests that failed at the transport, status or decode step",
};

pub const REQUEST_ERROR: MetricDef = MetricDef {
    name: "request.error",
    metric_type: MetricType::Counter,
    description: "Number of requests answered with an error envelope, by error kind",
};

pub const ALL_METRICS: &[MetricDef] = &[
    UPSTREAM_REQUEST_DURATION,
    UPSTREAM_REQUEST_FAILURE,
    REQUEST_ERROR,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique() {
        let names: HashSet<&str> = ALL_METRICS.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), ALL_METRICS.len());
    }
}

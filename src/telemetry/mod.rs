//! Request logging and log-derived metrics

mod metrics;
mod request_log;

pub use metrics::{percentile, MetricsAggregator, MetricsSnapshot, Topic};
pub use request_log::{LogRecord, RequestLog, CHITCHAT_TYPE};

//! Metrics for msgkit.
//!
//! Every crate records through the `metrics` facade re-exported here, behind
//! its own `metrics` feature. Nothing is collected until a recorder is
//! installed with [`init_metrics`]; with the `prometheus` feature the
//! recorder keeps everything in memory and renders the Prometheus text format.
//!
//! ```rust,ignore
//! use msgkit_metrics::{counter, dispatch, labels};
//!
//! counter!(dispatch::MESSAGES_RECEIVED_TOTAL, labels::CONTENT_KIND => "text").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};

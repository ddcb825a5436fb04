//! Metric name and label definitions.
//!
//! All metric names used by msgkit live here so the set of exported series
//! can be read in one place.

/// Inbound message dispatch
pub mod dispatch {
    /// Messages handed to the dispatcher, by content kind
    pub const MESSAGES_RECEIVED_TOTAL: &str = "msgkit_dispatch_messages_received_total";
    /// Messages ignored before reaching a handler (own messages, unknown content)
    pub const MESSAGES_IGNORED_TOTAL: &str = "msgkit_dispatch_messages_ignored_total";
    /// Commands routed to a handler, by trigger
    pub const COMMANDS_TOTAL: &str = "msgkit_dispatch_commands_total";
    /// Slash text that matched no registered command
    pub const UNKNOWN_COMMANDS_TOTAL: &str = "msgkit_dispatch_unknown_commands_total";
    /// Handler invocations that returned an error
    pub const HANDLER_ERRORS_TOTAL: &str = "msgkit_dispatch_handler_errors_total";
    /// Re-entrant intents refused by the depth guard
    pub const DEPTH_EXCEEDED_TOTAL: &str = "msgkit_dispatch_depth_exceeded_total";
    /// Time from receipt to handler completion in seconds
    pub const PROCESSING_DURATION_SECONDS: &str = "msgkit_dispatch_processing_duration_seconds";
}

/// Outbound sends
pub mod outbound {
    /// Messages sent into conversations, by content kind
    pub const MESSAGES_SENT_TOTAL: &str = "msgkit_outbound_messages_sent_total";
    /// Sends that failed at the transport
    pub const SEND_FAILURES_TOTAL: &str = "msgkit_outbound_send_failures_total";
    /// Fan-out recipients skipped as invalid
    pub const RECIPIENTS_SKIPPED_TOTAL: &str = "msgkit_outbound_recipients_skipped_total";
}

/// Text generation backend
pub mod agent {
    /// Generation requests issued
    pub const COMPLETIONS_TOTAL: &str = "msgkit_agent_completions_total";
    /// Generation requests that failed
    pub const COMPLETION_ERRORS_TOTAL: &str = "msgkit_agent_completion_errors_total";
    /// Duration of generation requests in seconds
    pub const COMPLETION_DURATION_SECONDS: &str = "msgkit_agent_completion_duration_seconds";
}

/// Common label keys used across metrics
pub mod labels {
    pub const CONTENT_KIND: &str = "content_kind";
    pub const TRIGGER: &str = "trigger";
    pub const REASON: &str = "reason";
    pub const MODEL: &str = "model";
}

/// Histogram buckets
pub mod buckets {
    /// Dispatch duration, 1ms to 60s
    pub const DISPATCH_DURATION: &[f64] = &[
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ];

    /// Model completion duration, 100ms to 5 minutes
    pub const COMPLETION_DURATION: &[f64] = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 180.0, 300.0,
    ];
}

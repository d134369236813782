//! Structured logging helpers.
//!
//! Every line carries a `component` field (`cf-01` .. `cf-04`) so logs from
//! the engine, cache, registry and controller can be told apart.

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with component
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with component
    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with component
    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with component
    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a card-related event with standard fields.
#[macro_export]
macro_rules! log_card_event {
    ($level:ident, $component:expr, $msg:expr, $card_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            card_id = %$card_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Classification for retry policy.
///
/// Used by the resilience wrapper to decide how to respond to an error
/// from an upstream provider.
///
/// # Behavior Summary
///
/// | Class | Retry With Backoff? | Counts Toward Circuit Breaker? |
/// |-------|--------------------|-------------------------------|
/// | `Never` | No | No |
/// | `Transient` | Yes | Yes (post-retry outcome) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - validation failure, business rejection, or terminal
    /// failure. The request is fundamentally unanswerable as posed.
    Never,

    /// Transport-level failure that may succeed on a later attempt
    /// (timeout, connection failure, 5xx, 429). Retried with exponential
    /// backoff; if retries exhaust, the failure is recorded against the
    /// provider's circuit breaker.
    Transient,
}

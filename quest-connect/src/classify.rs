//! Translation of raw RPC failures into display-ready outcomes.
//!
//! [`classify`] evaluates an ordered decision table; the first matching rule
//! wins. Code checks for rate limiting, user rejection and internal errors
//! precede every message check, so a rejected request mentioning "network"
//! is still [`ErrorCategory::UserRejected`].
//!
//! | # | Predicate                                         | Category            | Retry | Delay |
//! |---|---------------------------------------------------|---------------------|-------|-------|
//! | 0 | request cancelled by the caller                   | `ConnectivityLost`  | yes   | -     |
//! | 1 | code `-32002` / `UNKNOWN_ERROR`, "too many errors" | `RateLimited`       | yes   | 60 s  |
//! | 2 | code `4001`                                       | `UserRejected`      | no    | -     |
//! | 3 | code `-32603`                                     | `TransientInternal` | yes   | 5 s   |
//! | 4 | "insufficient funds"                              | `InsufficientFunds` | no    | -     |
//! | 5 | "nonce"                                           | `NonceConflict`     | yes   | -     |
//! | 6 | "network" / "connection"                          | `ConnectivityLost`  | yes   | -     |
//! | 7 | anything else                                     | `Unknown`           | yes   | -     |

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::{RpcFailure, codes};

/// Delay suggested after the endpoint reports it is overloaded.
pub const RATE_LIMIT_DELAY_SECS: u64 = 60;

/// Delay suggested after an internal RPC error.
pub const INTERNAL_ERROR_DELAY_SECS: u64 = 5;

const RATE_LIMIT_MARKERS: [&str; 2] = ["too many errors", "RPC endpoint returned too many errors"];

const RATE_LIMITED_MESSAGE: &str = "The RPC endpoint is temporarily rate-limited or overloaded. \
    Please wait 1-2 minutes and try again. If the issue persists, the network may be \
    experiencing high traffic.";
const USER_REJECTED_MESSAGE: &str = "Transaction was rejected by user.";
const INTERNAL_ERROR_MESSAGE: &str = "Internal RPC error. The network may be experiencing \
    issues. Please try again in a few moments.";
const INSUFFICIENT_FUNDS_MESSAGE: &str = "Insufficient funds for this transaction.";
const NONCE_MESSAGE: &str = "Transaction nonce error. Please try again.";
const CONNECTIVITY_MESSAGE: &str =
    "Network connection error. Please check your internet connection and try again.";
const CANCELLED_MESSAGE: &str =
    "The request was interrupted before the network answered. Please try again.";
const FALLBACK_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Closed set of outcome categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The user declined the wallet prompt.
    UserRejected,
    /// The endpoint is overloaded or rate-limiting.
    RateLimited,
    /// The wallet does not know the network and adding it failed.
    NetworkAddMissing,
    /// The account cannot cover value plus gas.
    InsufficientFunds,
    /// Nonce mismatch; resubmitting recomputes it.
    NonceConflict,
    /// Internal RPC error, usually short-lived.
    TransientInternal,
    /// The connection dropped, timed out, or the request was abandoned.
    ConnectivityLost,
    /// Anything else.
    Unknown,
}

impl ErrorCategory {
    /// Short headline for notifications.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::UserRejected => "Request cancelled",
            Self::RateLimited | Self::TransientInternal | Self::ConnectivityLost => {
                "Network Error"
            }
            Self::NetworkAddMissing => "Failed to add network",
            Self::InsufficientFunds | Self::NonceConflict | Self::Unknown => "Transaction failed",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Normalized, display-ready description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category}: {message}")]
pub struct ClassifiedError {
    /// Outcome category.
    pub category: ErrorCategory,
    /// Non-empty message suitable for direct display.
    pub message: String,
    /// Whether trying again (automatically or by the user) can succeed.
    pub retryable: bool,
    /// Suggested wait before retrying, in seconds.
    pub suggested_delay_secs: Option<u64>,
}

impl ClassifiedError {
    /// Creates a classified error. An empty `message` is replaced with a
    /// generic fallback.
    pub fn new(
        category: ErrorCategory,
        message: impl Into<String>,
        retryable: bool,
        suggested_delay_secs: Option<u64>,
    ) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_owned()
        } else {
            message
        };
        Self {
            category,
            message,
            retryable,
            suggested_delay_secs,
        }
    }

    /// Suggested wait before retrying.
    #[must_use]
    pub fn suggested_delay(&self) -> Option<Duration> {
        self.suggested_delay_secs.map(Duration::from_secs)
    }
}

/// Classifies a raw failure. Never returns an empty message.
#[must_use]
pub fn classify(error: &RpcFailure) -> ClassifiedError {
    use ErrorCategory::{
        ConnectivityLost, InsufficientFunds, NonceConflict, RateLimited, TransientInternal,
        Unknown, UserRejected,
    };

    let message = error.message_str();

    let classified = if error.cancelled {
        ClassifiedError::new(ConnectivityLost, CANCELLED_MESSAGE, true, None)
    } else if is_rate_limited(error) {
        ClassifiedError::new(
            RateLimited,
            RATE_LIMITED_MESSAGE,
            true,
            Some(RATE_LIMIT_DELAY_SECS),
        )
    } else if error.has_code(codes::USER_REJECTED) {
        ClassifiedError::new(UserRejected, USER_REJECTED_MESSAGE, false, None)
    } else if error.has_code(codes::INTERNAL_ERROR) {
        ClassifiedError::new(
            TransientInternal,
            INTERNAL_ERROR_MESSAGE,
            true,
            Some(INTERNAL_ERROR_DELAY_SECS),
        )
    } else if message.contains("insufficient funds") {
        ClassifiedError::new(InsufficientFunds, INSUFFICIENT_FUNDS_MESSAGE, false, None)
    } else if message.contains("nonce") {
        ClassifiedError::new(NonceConflict, NONCE_MESSAGE, true, None)
    } else if message.contains("network") || message.contains("connection") {
        ClassifiedError::new(ConnectivityLost, CONNECTIVITY_MESSAGE, true, None)
    } else {
        ClassifiedError::new(Unknown, message, true, None)
    };

    tracing::debug!(
        raw = %error,
        category = %classified.category,
        retryable = classified.retryable,
        "classified RPC failure"
    );
    classified
}

fn is_rate_limited(error: &RpcFailure) -> bool {
    let by_code = error.code.as_ref().is_some_and(|code| {
        code.is(codes::RATE_LIMITED) || code.is_symbol(codes::UNKNOWN_ERROR)
    });
    by_code
        || RATE_LIMIT_MARKERS
            .iter()
            .any(|marker| error.message_str().contains(marker))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn rate_limit_code_is_retryable_after_a_minute() {
        let classified = classify(&RpcFailure::with_code(-32002));
        assert_eq!(classified.category, ErrorCategory::RateLimited);
        assert!(classified.retryable);
        assert_eq!(classified.suggested_delay_secs, Some(60));
        assert!(classified.message.contains("rate-limited or overloaded"));
    }

    #[test]
    fn unknown_error_symbol_is_rate_limited() {
        let classified = classify(&RpcFailure::symbolic("UNKNOWN_ERROR", "could not coalesce"));
        assert_eq!(classified.category, ErrorCategory::RateLimited);
    }

    #[test]
    fn too_many_errors_message_is_rate_limited() {
        let failure = RpcFailure::with_message("RPC endpoint returned too many errors, retrying");
        assert_eq!(classify(&failure).category, ErrorCategory::RateLimited);
    }

    #[test]
    fn user_rejection_is_final() {
        let classified = classify(&RpcFailure::with_code(4001));
        assert_eq!(classified.category, ErrorCategory::UserRejected);
        assert!(!classified.retryable);
        assert_eq!(classified.suggested_delay_secs, None);
    }

    #[test]
    fn internal_error_suggests_short_delay() {
        let classified = classify(&RpcFailure::new(-32603, "execution reverted"));
        assert_eq!(classified.category, ErrorCategory::TransientInternal);
        assert!(classified.retryable);
        assert_eq!(classified.suggested_delay(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn insufficient_funds_is_not_retryable() {
        let classified = classify(&RpcFailure::with_message("insufficient funds for gas"));
        assert_eq!(classified.category, ErrorCategory::InsufficientFunds);
        assert!(!classified.retryable);
    }

    #[test]
    fn insufficient_funds_wins_over_nonce_and_network() {
        let failure =
            RpcFailure::with_message("insufficient funds: nonce 4 on network mantle");
        assert_eq!(classify(&failure).category, ErrorCategory::InsufficientFunds);
    }

    #[test]
    fn nonce_wins_over_network() {
        let failure = RpcFailure::with_message("nonce too low for network");
        assert_eq!(classify(&failure).category, ErrorCategory::NonceConflict);
        assert!(classify(&failure).retryable);
    }

    #[test]
    fn connection_message_is_connectivity_lost() {
        for message in ["network changed", "connection refused"] {
            let classified = classify(&RpcFailure::with_message(message));
            assert_eq!(classified.category, ErrorCategory::ConnectivityLost);
            assert!(classified.retryable);
        }
    }

    #[test]
    fn cancellation_is_connectivity_lost() {
        let classified = classify(&RpcFailure::cancelled());
        assert_eq!(classified.category, ErrorCategory::ConnectivityLost);
        assert!(classified.retryable);
    }

    #[test]
    fn unknown_keeps_raw_message() {
        let classified = classify(&RpcFailure::new(-32000, "execution reverted: paused"));
        assert_eq!(classified.category, ErrorCategory::Unknown);
        assert_eq!(classified.message, "execution reverted: paused");
        assert!(classified.retryable);
    }

    #[test]
    fn unknown_without_message_uses_fallback() {
        for failure in [RpcFailure::default(), RpcFailure::with_message("   ")] {
            let classified = classify(&failure);
            assert_eq!(classified.category, ErrorCategory::Unknown);
            assert_eq!(classified.message, FALLBACK_MESSAGE);
        }
    }

    #[test]
    fn headline_groups_network_problems() {
        assert_eq!(ErrorCategory::RateLimited.headline(), "Network Error");
        assert_eq!(ErrorCategory::Unknown.headline(), "Transaction failed");
    }

    fn any_code() -> impl Strategy<Value = Option<i64>> {
        prop_oneof![
            Just(None),
            Just(Some(-32002)),
            Just(Some(4001)),
            Just(Some(-32603)),
            Just(Some(4902)),
            any::<i64>().prop_map(Some),
        ]
    }

    fn any_message() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("network error".to_owned())),
            Just(Some("insufficient funds for gas".to_owned())),
            Just(Some("nonce too low".to_owned())),
            Just(Some("too many errors".to_owned())),
            ".{0,40}".prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn rate_limit_code_beats_any_message(message in any_message()) {
            let failure = RpcFailure {
                code: Some(crate::connection::ErrorCode::Numeric(-32002)),
                message,
                cancelled: false,
            };
            let classified = classify(&failure);
            prop_assert_eq!(classified.category, ErrorCategory::RateLimited);
            prop_assert!(classified.retryable);
        }

        #[test]
        fn user_rejection_beats_every_message_rule(suffix in ".{0,40}") {
            let failure = RpcFailure::new(4001, format!("network connection nonce {suffix}"));
            let classified = classify(&failure);
            // Rule 1 can still match through the message marker.
            if !failure.message_str().contains("too many errors") {
                prop_assert_eq!(classified.category, ErrorCategory::UserRejected);
                prop_assert!(!classified.retryable);
            }
        }

        #[test]
        fn message_is_never_empty(code in any_code(), message in any_message(), cancelled in any::<bool>()) {
            let failure = RpcFailure {
                code: code.map(crate::connection::ErrorCode::Numeric),
                message,
                cancelled,
            };
            prop_assert!(!classify(&failure).message.trim().is_empty());
        }
    }
}

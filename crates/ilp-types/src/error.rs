//! The two-axis error taxonomy shared by the codec and the packet plane.

use std::fmt;

/// Codec-layer failures. No panics occur in the codec; every malformed input
/// surfaces as one of these two variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("buffer underflow: needed at least {needed} bytes, had {available}")]
    BufferUnderflow { needed: usize, available: usize },
    #[error("invalid packet: {0}")]
    InvalidPacket(String),
}

impl CodecError {
    pub fn underflow(needed: usize, available: usize) -> Self {
        Self::BufferUnderflow { needed, available }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPacket(reason.into())
    }
}

/// ILP Reject error codes, closed over three categories:
/// `F*` (final, do not retry), `T*` (transient, retry-safe), `R*` (relative-time/expiry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IlpErrorCode {
    F01InvalidPacket,
    F02Unreachable,
    F03InvalidAmount,
    F05WrongCondition,
    F99ApplicationError,
    T00InternalError,
    T01PeerUnreachable,
    T04InsufficientLiquidity,
    T99ApplicationError,
    R00TransferTimedOut,
}

impl IlpErrorCode {
    /// The 3-character wire code, e.g. `F02`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::F01InvalidPacket => "F01",
            Self::F02Unreachable => "F02",
            Self::F03InvalidAmount => "F03",
            Self::F05WrongCondition => "F05",
            Self::F99ApplicationError => "F99",
            Self::T00InternalError => "T00",
            Self::T01PeerUnreachable => "T01",
            Self::T04InsufficientLiquidity => "T04",
            Self::T99ApplicationError => "T99",
            Self::R00TransferTimedOut => "R00",
        }
    }

    /// Parse a known 3-character code. Unknown codes are not represented by
    /// this closed enum; callers needing to preserve an upstream code they
    /// don't recognize should keep the raw string on [`crate::packet::Reject`] instead.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "F01" => Some(Self::F01InvalidPacket),
            "F02" => Some(Self::F02Unreachable),
            "F03" => Some(Self::F03InvalidAmount),
            "F05" => Some(Self::F05WrongCondition),
            "F99" => Some(Self::F99ApplicationError),
            "T00" => Some(Self::T00InternalError),
            "T01" => Some(Self::T01PeerUnreachable),
            "T04" => Some(Self::T04InsufficientLiquidity),
            "T99" => Some(Self::T99ApplicationError),
            "R00" => Some(Self::R00TransferTimedOut),
            _ => None,
        }
    }

    /// Category letter: final, transient, or relative-time.
    pub const fn category(self) -> ErrorCategory {
        match self.as_str().as_bytes()[0] {
            b'F' => ErrorCategory::Final,
            b'T' => ErrorCategory::Transient,
            b'R' => ErrorCategory::RelativeTime,
            _ => unreachable!("all variants start with F, T, or R"),
        }
    }
}

impl fmt::Display for IlpErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category axis of an ILP error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `F*` — final, do not retry.
    Final,
    /// `T*` — transient, retry safe.
    Transient,
    /// `R*` — relative-time / expiry class.
    RelativeTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_codes() {
        for code in [
            IlpErrorCode::F01InvalidPacket,
            IlpErrorCode::F02Unreachable,
            IlpErrorCode::T04InsufficientLiquidity,
            IlpErrorCode::R00TransferTimedOut,
        ] {
            assert_eq!(IlpErrorCode::parse(code.as_str()), Some(code));
        }
    }

    #[test]
    fn categorizes_by_leading_letter() {
        assert_eq!(IlpErrorCode::F02Unreachable.category(), ErrorCategory::Final);
        assert_eq!(
            IlpErrorCode::T01PeerUnreachable.category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            IlpErrorCode::R00TransferTimedOut.category(),
            ErrorCategory::RelativeTime
        );
    }
}

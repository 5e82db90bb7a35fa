//! Error types of the probe core
//!
//! None of these ever escape `begin`/`tick`/`publish`: network failures
//! are retried on the next supervisory cycle and only show up in logs,
//! the indicator and the returned reports.

/// Invalid [`ProbeConfig`](crate::ProbeConfig)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A topic is empty
    EmptyTopic,
    /// A topic contains a wildcard where a topic name is required, or a NUL
    InvalidTopic,
    /// The location tag is empty
    EmptyLocation,
    /// The location tag contains a line-protocol separator
    InvalidLocation,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyTopic => write!(f, "empty topic"),
            Self::InvalidTopic => write!(f, "invalid topic"),
            Self::EmptyLocation => write!(f, "empty location tag"),
            Self::InvalidLocation => write!(f, "invalid location tag"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Reading that cannot be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// NaN or infinite value
    NonFinite,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "non-finite reading"),
        }
    }
}

impl core::error::Error for EncodeError {}

//! Verbosity-gated logging
//!
//! Every log line of the crate goes through the `log_*!` macros below.
//! They compare the line's level against [`crate::config::LOG_VERBOSITY`]
//! at compile time and forward to `defmt` when the `defmt` feature is
//! enabled. Without the feature the arguments are still type-checked but
//! nothing is emitted, which keeps host builds free of a global logger.
//!
//! Format strings must stick to plain `{}` placeholders so they are valid
//! for both `defmt` and `core::fmt`.

/// Log verbosity threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verbosity {
    /// Nothing is logged
    Quiet = 0,
    /// Errors and warnings
    Warn = 1,
    /// Connection progress
    Info = 2,
    /// Message contents
    Debug = 3,
}

impl Verbosity {
    /// Map a numeric level (0..=3) to a verbosity; larger values saturate
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Quiet,
            1 => Self::Warn,
            2 => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Whether a line of `level` is emitted under this threshold
    pub const fn allows(self, level: Verbosity) -> bool {
        level as u8 != 0 && level as u8 <= self as u8
    }
}

#[cfg(test)]
std::thread_local! {
    static EMITTED: core::cell::RefCell<std::vec::Vec<Verbosity>> =
        const { core::cell::RefCell::new(std::vec::Vec::new()) };
}

/// Remember the level of an emitted line (test builds)
#[cfg(test)]
pub(crate) fn record(level: Verbosity) {
    EMITTED.with(|emitted| emitted.borrow_mut().push(level));
}

/// Levels emitted on this thread since the last call, oldest first
#[cfg(test)]
pub(crate) fn take_emitted() -> std::vec::Vec<Verbosity> {
    EMITTED.with(|emitted| emitted.take())
}

macro_rules! log_at {
    ($level:ident, $defmt:ident, $($arg:tt)+) => {{
        if $crate::config::LOG_VERBOSITY.allows($crate::log::Verbosity::$level) {
            #[cfg(test)]
            $crate::log::record($crate::log::Verbosity::$level);
            #[cfg(feature = "defmt")]
            defmt::$defmt!($($arg)+);
            #[cfg(not(feature = "defmt"))]
            let _ = core::format_args!($($arg)+);
        }
    }};
}

macro_rules! log_error {
    ($($arg:tt)+) => { log_at!(Warn, error, $($arg)+) };
}

macro_rules! log_warn {
    ($($arg:tt)+) => { log_at!(Warn, warn, $($arg)+) };
}

macro_rules! log_info {
    ($($arg:tt)+) => { log_at!(Info, info, $($arg)+) };
}

macro_rules! log_debug {
    ($($arg:tt)+) => { log_at!(Debug, debug, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_level() {
        assert_eq!(Verbosity::from_level(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_level(1), Verbosity::Warn);
        assert_eq!(Verbosity::from_level(2), Verbosity::Info);
        assert_eq!(Verbosity::from_level(3), Verbosity::Debug);
        assert_eq!(Verbosity::from_level(9), Verbosity::Debug);
    }

    #[test]
    fn test_allows() {
        assert!(!Verbosity::Quiet.allows(Verbosity::Warn));
        assert!(Verbosity::Warn.allows(Verbosity::Warn));
        assert!(!Verbosity::Warn.allows(Verbosity::Info));
        assert!(Verbosity::Info.allows(Verbosity::Warn));
        assert!(Verbosity::Debug.allows(Verbosity::Debug));
        // Quiet is a threshold, never a line level
        assert!(!Verbosity::Debug.allows(Verbosity::Quiet));
    }

    #[test]
    fn test_macros_expand_without_logger() {
        take_emitted();

        let field = "temperature";
        log_error!("error {}", field);
        log_warn!("warn {}", field);
        log_info!("info {}", 42u8);
        log_debug!("debug {}", field);

        // Debug lines are filtered out at the configured verbosity
        assert_eq!(
            take_emitted(),
            vec![Verbosity::Warn, Verbosity::Warn, Verbosity::Info]
        );
        assert!(take_emitted().is_empty());
    }
}

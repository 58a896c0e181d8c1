use std::fmt;
use std::str::FromStr;

/// The eight severity tiers a record can carry, ordered by importance.
///
/// Discriminants are the numeric level codes used on the wire and in
/// [`LogRecord::level`](crate::record::LogRecord::level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Severity {
    Debug = 100,
    Info = 200,
    Notice = 250,
    Warning = 300,
    Error = 400,
    Critical = 500,
    Alert = 550,
    Emergency = 600,
}

/// Returned when a level code is not one of the eight known severities.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown severity level code {0}")]
pub struct UnknownSeverity(pub u16);

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Alert,
        Severity::Emergency,
    ];

    /// Resolve a numeric level code.
    pub fn from_code(code: u16) -> Result<Self, UnknownSeverity> {
        match code {
            100 => Ok(Severity::Debug),
            200 => Ok(Severity::Info),
            250 => Ok(Severity::Notice),
            300 => Ok(Severity::Warning),
            400 => Ok(Severity::Error),
            500 => Ok(Severity::Critical),
            550 => Ok(Severity::Alert),
            600 => Ok(Severity::Emergency),
            other => Err(UnknownSeverity(other)),
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Upper-case display name, used verbatim as the attachment title.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }

    /// Hex color of the attachment bar for this severity.
    pub const fn color(self) -> &'static str {
        match self {
            Severity::Debug => "#9E9E9E",
            Severity::Info => "#4CAF50",
            Severity::Notice => "#607D8B",
            Severity::Warning => "#FFEB3B",
            Severity::Error | Severity::Critical | Severity::Alert | Severity::Emergency => "#F44336",
        }
    }
}

/// Look up the attachment color for a raw level code.
///
/// **Returns**
/// - `Ok(color)` for the eight known codes.
/// - `Err(UnknownSeverity)` otherwise; there is no fallback color.
pub fn color_for(level: u16) -> Result<&'static str, UnknownSeverity> {
    Severity::from_code(level).map(Severity::color)
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing a severity name fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity name {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "notice" => Ok(Severity::Notice),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            "alert" => Ok(Severity::Alert),
            "emergency" => Ok(Severity::Emergency),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_level_has_a_hex_color() {
        for severity in Severity::ALL {
            let color = color_for(severity.code()).unwrap();
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(color_for(severity.code()).unwrap(), color);
        }
    }

    #[test]
    fn palette_matches_expected_tokens() {
        assert_eq!(color_for(100), Ok("#9E9E9E"));
        assert_eq!(color_for(200), Ok("#4CAF50"));
        assert_eq!(color_for(250), Ok("#607D8B"));
        assert_eq!(color_for(300), Ok("#FFEB3B"));
        for code in [400, 500, 550, 600] {
            assert_eq!(color_for(code), Ok("#F44336"));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        for code in [0, 99, 101, 350, 601, u16::MAX] {
            assert_eq!(color_for(code), Err(UnknownSeverity(code)));
        }
    }

    #[test]
    fn codes_round_trip_and_order() {
        for severity in Severity::ALL {
            assert_eq!(Severity::from_code(severity.code()), Ok(severity));
        }
        assert!(Severity::Debug < Severity::Notice);
        assert!(Severity::Alert < Severity::Emergency);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!(" warn ".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("Emergency".parse::<Severity>(), Ok(Severity::Emergency));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn maps_tracing_levels() {
        assert_eq!(Severity::from(tracing::Level::TRACE), Severity::Debug);
        assert_eq!(Severity::from(tracing::Level::WARN), Severity::Warning);
        assert_eq!(Severity::from(tracing::Level::ERROR), Severity::Error);
    }
}

use std::time::Duration;

use crate::types::ConfigError;

/// Parse a compact duration such as `10m`, `1m30s`, `1.5s` or `250ms`.
/// A trailing number without a unit is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let trimmed = input.trim();
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut chars = trimmed.chars().peekable();

    while chars.peek().is_some() {
        let mut number = String::new();
        while let Some(c) = chars
            .peek()
            .copied()
            .filter(|c| c.is_ascii_digit() || *c == '.')
        {
            number.push(c);
            chars.next();
        }
        let mut unit = String::new();
        while let Some(c) = chars
            .peek()
            .copied()
            .filter(|c| !c.is_ascii_digit() && *c != '.')
        {
            unit.push(c);
            chars.next();
        }

        let unit_nanos: u64 = match unit.as_str() {
            "h" => 3_600_000_000_000,
            "m" => 60_000_000_000,
            "s" | "" => 1_000_000_000,
            "ms" => 1_000_000,
            "us" | "µs" => 1_000,
            "ns" => 1,
            _ => {
                return Err(ConfigError::InvalidDurationUnit {
                    unit,
                    input: input.to_string(),
                });
            }
        };

        let part = if number.contains('.') {
            let value: f64 = number.parse().map_err(|_| invalid())?;
            let nanos = (value * unit_nanos as f64).round();
            if !nanos.is_finite() || nanos >= u64::MAX as f64 {
                return Err(invalid());
            }
            Duration::from_nanos(nanos as u64)
        } else {
            let value: u64 = number.parse().map_err(|_| invalid())?;
            Duration::from_nanos(value.checked_mul(unit_nanos).ok_or_else(invalid)?)
        };
        total = total.checked_add(part).ok_or_else(invalid)?;
    }

    Ok(total)
}

/// clap value parser wrapper around [`parse_duration`]
pub fn duration_arg(input: &str) -> Result<Duration, String> {
    parse_duration(input).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("15us").unwrap(), Duration::from_micros(15));
    }

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(
            parse_duration("1h2m3s").unwrap(),
            Duration::from_secs(3600 + 120 + 3)
        );
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parses_fractional_values() {
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("0.5h").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("2.5ms").unwrap(), Duration::from_micros(2500));
        assert_eq!(parse_duration("1m0.5s").unwrap(), Duration::from_millis(60_500));
    }

    #[test]
    fn overflow_is_an_error_not_a_panic() {
        assert!(matches!(
            parse_duration("9999999999999999h"),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_duration("99999999999999999999999s"),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_duration("1e300h"),
            Err(ConfigError::InvalidDurationUnit { .. })
        ));
        assert!(matches!(
            parse_duration("99999999999999999999.5h"),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(duration_arg("9999999999999999h").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("1.2.3s").is_err());
        assert!(parse_duration(".").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(matches!(
            parse_duration("3d"),
            Err(ConfigError::InvalidDurationUnit { .. })
        ));
    }
}

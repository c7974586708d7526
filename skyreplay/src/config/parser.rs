//! INI parsing logic for converting `Ini` → `ReplayConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ReplayConfig;

const REPLAY_SECTION: &str = "replay";

/// Parse an `Ini` object into a `ReplayConfig`.
///
/// Starts from `ReplayConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ReplayConfig, ConfigFileError> {
    let mut config = ReplayConfig::default();

    // [replay] section
    if let Some(section) = ini.section(Some(REPLAY_SECTION)) {
        if let Some(v) = parse_key::<usize>(section, "trace_capacity", "must be an integer")? {
            if v == 0 {
                return Err(invalid("trace_capacity", v, "must be at least 1"));
            }
            config.trace_capacity = v;
        }
        if let Some(v) = parse_key::<f64>(section, "time_scale", "must be a number")? {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid("time_scale", v, "must be a finite value >= 0"));
            }
            config.time_scale = v;
        }
        if let Some(v) = parse_key::<u64>(section, "tick_interval_ms", "must be an integer")? {
            if v == 0 {
                return Err(invalid("tick_interval_ms", v, "must be at least 1"));
            }
            config.tick_interval = Duration::from_millis(v);
        }
        if let Some(v) = parse_key::<f64>(section, "fast_forward_step", "must be a number")? {
            if !v.is_finite() || v <= 0.0 {
                return Err(invalid("fast_forward_step", v, "must be a positive number"));
            }
            config.fast_forward_step = v;
        }
        if let Some(v) =
            parse_key::<usize>(section, "fast_forward_max_steps", "must be an integer")?
        {
            if v == 0 {
                return Err(invalid("fast_forward_max_steps", v, "must be at least 1"));
            }
            config.fast_forward_max_steps = v;
        }
    }

    Ok(config)
}

fn parse_key<T: FromStr>(
    section: &Properties,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    raw.parse()
        .map(Some)
        .map_err(|_| invalid(key, raw, reason))
}

fn invalid(key: &str, value: impl ToString, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: REPLAY_SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ReplayConfig, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ReplayConfig::default());
    }

    #[test]
    fn test_all_keys_parsed() {
        let config = parse(
            "[replay]\n\
             trace_capacity = 20\n\
             time_scale = 4.5\n\
             tick_interval_ms = 40\n\
             fast_forward_step = 0.5\n\
             fast_forward_max_steps = 100\n",
        )
        .unwrap();

        assert_eq!(config.trace_capacity, 20);
        assert_eq!(config.time_scale, 4.5);
        assert_eq!(config.tick_interval, Duration::from_millis(40));
        assert_eq!(config.fast_forward_step, 0.5);
        assert_eq!(config.fast_forward_max_steps, 100);
    }

    #[test]
    fn test_other_sections_ignored() {
        let config = parse("[display]\ntrace_capacity = 0\n").unwrap();
        assert_eq!(config, ReplayConfig::default());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for content in [
            "[replay]\ntrace_capacity = 0\n",
            "[replay]\ntime_scale = -2\n",
            "[replay]\ntick_interval_ms = 0\n",
            "[replay]\nfast_forward_step = 0\n",
            "[replay]\nfast_forward_max_steps = 0\n",
        ] {
            assert!(
                matches!(parse(content), Err(ConfigFileError::InvalidValue { .. })),
                "{content}"
            );
        }
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let err = parse("[replay]\ntrace_capacity = many\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "replay");
                assert_eq!(key, "trace_capacity");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

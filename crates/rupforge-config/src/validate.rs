//! Parameter checks shared by configuration loading and filter construction.

use crate::ConfigError;

fn invalid(name: &str, value: f64, rule: &str) -> ConfigError {
    ConfigError::Invalid(format!("{} must be {}, got {}", name, rule, value))
}

/// Value must be finite.
pub fn finite(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(name, value, "finite"))
    }
}

/// Value must be finite and `>= 0`.
pub fn non_negative(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "non-negative"))
    }
}

/// Value must be finite and `> 0`.
pub fn positive(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "positive"))
    }
}

/// Value must lie in `[0, 1]`.
pub fn fraction(name: &str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(name, value, "in [0, 1]"))
    }
}

/// Value must lie in `(0, 1]`.
pub fn probability_threshold(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "in (0, 1]"))
    }
}

/// Count must be at least one.
pub fn at_least_one(name: &str, value: usize) -> Result<usize, ConfigError> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid(format!("{} must be at least 1", name)))
    }
}

/// List must not be empty.
pub fn non_empty<'a, T>(name: &str, values: &'a [T]) -> Result<&'a [T], ConfigError> {
    if values.is_empty() {
        Err(ConfigError::Invalid(format!("{} must not be empty", name)))
    } else {
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks() {
        assert!(finite("x", f64::NAN).is_err());
        assert!(non_negative("x", -1.0).is_err());
        assert_eq!(non_negative("x", 0.0).unwrap(), 0.0);
        assert!(positive("x", 0.0).is_err());
        assert!(fraction("x", 1.01).is_err());
        assert!(probability_threshold("x", 0.0).is_err());
        assert_eq!(probability_threshold("x", 1.0).unwrap(), 1.0);
        assert!(at_least_one("n", 0).is_err());
        assert!(non_empty::<u8>("list", &[]).is_err());
    }

    #[test]
    fn test_message() {
        let err = positive("threshold", -2.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: threshold must be positive, got -2"
        );
    }
}

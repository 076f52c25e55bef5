use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

fn hex_color() -> &'static Regex {
    static HEX: OnceLock<Regex> = OnceLock::new();
    HEX.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("hex color pattern is valid"))
}

/// Trim a required text field, rejecting blank input
pub fn require_text(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::field(field, &format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Same as `require_text` for fields that are only present on updates
pub fn optional_text(field: &str, value: Option<&str>) -> AppResult<Option<String>> {
    value.map(|v| require_text(field, v)).transpose()
}

/// Deserialize a nullable update field: absent is `None`, `null` is `Some(None)`.
/// Pair with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validate a `#RRGGBB` color
pub fn validate_color(color: &str) -> AppResult<()> {
    if !hex_color().is_match(color) {
        return Err(AppError::field("color", "color must be a hex value like #22aa88"));
    }
    Ok(())
}

pub fn validate_day_number(day_number: i32, duration_days: i32) -> AppResult<()> {
    if day_number < 1 || day_number > duration_days {
        return Err(AppError::field(
            "day_number",
            &format!("day_number must be between 1 and {}", duration_days),
        ));
    }
    Ok(())
}

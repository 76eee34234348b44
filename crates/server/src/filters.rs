//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a numeric rating as filled stars, e.g. `3` becomes `★★★`.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let n = rating.to_string().parse::<usize>().unwrap_or(0).min(5);
    Ok("★".repeat(n))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stars_repeats_and_caps() {
        assert_eq!(stars::default().execute(3, &askama::NO_VALUES).unwrap(), "★★★");
        assert_eq!(stars::default().execute(0, &askama::NO_VALUES).unwrap(), "");
        assert_eq!(stars::default().execute(9, &askama::NO_VALUES).unwrap(), "★★★★★");
    }
}

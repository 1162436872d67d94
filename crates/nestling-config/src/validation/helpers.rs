//! Shared range check used by every numeric setting.

use std::fmt::Display;
use std::ops::RangeInclusive;

/// Record `name` as out of range unless `value` lies in `range`.
///
/// NaN is never in range.
pub(crate) fn check_range<T>(
    errors: &mut Vec<String>,
    name: &str,
    value: T,
    range: RangeInclusive<T>,
) where
    T: PartialOrd + Display,
{
    if !range.contains(&value) {
        errors.push(format!(
            "{name} = {value} is out of range [{}, {}]",
            range.start(),
            range.end()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let mut errors = Vec::new();
        check_range(&mut errors, "a", 1u32, 1..=4);
        check_range(&mut errors, "b", 4.0, 1.0..=4.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn reports_value_and_range() {
        let mut errors = Vec::new();
        check_range(&mut errors, "compositor.event_capacity", 0u32, 1..=4096);
        check_range(&mut errors, "replay.device_pixel_ratio", f64::NAN, 1.0..=4.0);
        assert_eq!(
            errors,
            vec![
                "compositor.event_capacity = 0 is out of range [1, 4096]".to_string(),
                "replay.device_pixel_ratio = NaN is out of range [1, 4]".to_string(),
            ]
        );
    }
}

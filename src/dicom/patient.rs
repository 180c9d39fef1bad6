//! Patient age / birth date inference.
//!
//! Only one direction is ever attempted: a missing birth date is estimated from
//! the age string, or a missing age is computed from the birth date.

use crate::types::{PatientInfo, UNKNOWN};
use chrono::{Datelike, NaiveDate};
use log::debug;

const MAX_PLAUSIBLE_AGE: i32 = 150;

/// Parse a date in `YYYYMMDD`, `YYYY.MM.DD`, `YYYY-MM-DD` or `DD/MM/YYYY` form
#[must_use]
pub fn parse_dicom_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let (year, month, day) = if value.len() == 8 && all_digits(value) {
        (&value[0..4], &value[4..6], &value[6..8])
    } else if let Some(parts) = split_exact(value, '.').or_else(|| split_exact(value, '-')) {
        if parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
            return None;
        }
        (parts[0], parts[1], parts[2])
    } else if let Some(parts) = split_exact(value, '/') {
        if parts[0].len() != 2 || parts[1].len() != 2 || parts[2].len() != 4 {
            return None;
        }
        (parts[2], parts[1], parts[0])
    } else {
        return None;
    };

    if ![year, month, day].into_iter().all(all_digits) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn split_exact(value: &str, separator: char) -> Option<[&str; 3]> {
    let mut parts = value.split(separator);
    let result = [parts.next()?, parts.next()?, parts.next()?];
    parts.next().is_none().then_some(result)
}

/// Age in full years on `today`; `None` when the result is outside `[0, 150]`
#[must_use]
pub fn age_from_birth_date(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }

    if !(0..=MAX_PLAUSIBLE_AGE).contains(&age) {
        debug!("Implausible age {age} computed from birth date {birth}");
        return None;
    }
    u32::try_from(age).ok()
}

/// Estimate a birth date (`YYYY0101`) from an age string such as `045Y` or `18M`
#[must_use]
pub fn birth_date_from_age(age: &str, today: NaiveDate) -> Option<String> {
    let age = age.trim();
    let unit = age.chars().last()?;
    let digits = &age[..age.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i32 = digits.parse().ok()?;

    let years = match unit {
        'Y' => value,
        'M' => value / 12,
        'W' => value / 52,
        'D' => value / 365,
        _ => return None,
    };

    Some(format!("{:04}0101", today.year() - years))
}

/// Fill in whichever of age / birth date is missing, if the other is usable
pub fn infer_age_fields(patient: &mut PatientInfo, today: NaiveDate) {
    let birth_missing = patient.birth_date == UNKNOWN;
    let age_missing = patient.age == UNKNOWN;

    if birth_missing && !age_missing {
        if let Some(birth) = birth_date_from_age(&patient.age, today) {
            debug!("Estimated birth date {birth} from age {}", patient.age);
            patient.birth_date = birth;
        }
    } else if age_missing && !birth_missing {
        patient.age = parse_dicom_date(&patient.birth_date)
            .and_then(|birth| age_from_birth_date(birth, today))
            .map_or_else(|| UNKNOWN.to_string(), |age| age.to_string());
    }
}

/// Format a date as `YYYY-MM-DD` for display; unparseable values are shown verbatim
#[must_use]
pub fn format_date(value: &str) -> String {
    if value == UNKNOWN {
        return value.to_string();
    }
    parse_dicom_date(value).map_or_else(|| value.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

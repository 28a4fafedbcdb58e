use super::domain::{DemographicFacts, Gender};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const IDENTIFIER_LEN: usize = 18;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[1-9][0-9]{5}(18|19|20)[0-9]{2}(0[1-9]|1[0-2])((0[1-9]|[12][0-9])|30|31)[0-9]{3}[0-9Xx]$",
    )
    .expect("valid identifier regex")
});

/// Derives birth date, gender and age from an 18-character identifier.
///
/// Returns `None` for anything that does not match the identifier layout, for
/// embedded dates that do not exist on the calendar, and for birth dates after
/// `today`. There is never a partial result. The check character is only
/// matched against the layout, not recomputed.
pub fn extract(identifier: &str, today: NaiveDate) -> Option<DemographicFacts> {
    let identifier = identifier.trim();
    if identifier.len() != IDENTIFIER_LEN || !IDENTIFIER_PATTERN.is_match(identifier) {
        return None;
    }

    // The pattern only admits ASCII, so byte offsets are character offsets.
    let year: i32 = identifier[6..10].parse().ok()?;
    let month: u32 = identifier[10..12].parse().ok()?;
    let day: u32 = identifier[12..14].parse().ok()?;
    let birth_date = NaiveDate::from_ymd_opt(year, month, day)?;
    if birth_date > today {
        return None;
    }

    let sequence = identifier.as_bytes()[16] - b'0';
    let gender = if sequence % 2 == 1 {
        Gender::Male
    } else {
        Gender::Female
    };

    Some(DemographicFacts {
        birth_date,
        gender,
        age: age_on(birth_date, today),
    })
}

/// Whole years between `birth_date` and `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn extracts_birth_date_gender_and_age() {
        let facts = extract("110101199003070017", date(2026, 10, 18)).expect("valid identifier");
        assert_eq!(facts.birth_date, date(1990, 3, 7));
        assert_eq!(facts.gender, Gender::Male);
        assert_eq!(facts.age, 36);
    }

    #[test]
    fn age_drops_by_one_before_the_birthday() {
        assert_eq!(
            extract("110101199003070017", date(2026, 3, 6)).map(|f| f.age),
            Some(35)
        );
        assert_eq!(
            extract("110101199003070017", date(2026, 3, 7)).map(|f| f.age),
            Some(36)
        );
    }

    #[test]
    fn even_sequence_digit_is_female_and_lowercase_check_is_accepted() {
        let facts = extract("11010119900307002x", date(2026, 1, 1)).expect("valid identifier");
        assert_eq!(facts.gender, Gender::Female);
        let upper = extract("11010119900307002X", date(2026, 1, 1)).expect("valid identifier");
        assert_eq!(facts, upper);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert!(extract("  110101199003070017\t", date(2026, 1, 1)).is_some());
    }

    #[test]
    fn leap_day_birthdays_count_from_march_first() {
        let born = "110101200002290011";
        assert_eq!(extract(born, date(2025, 2, 28)).map(|f| f.age), Some(24));
        assert_eq!(extract(born, date(2025, 3, 1)).map(|f| f.age), Some(25));
    }

    #[test]
    fn malformed_identifiers_yield_nothing() {
        let today = date(2026, 1, 1);
        for candidate in [
            "",
            "11010119900307001",
            "1101011990030700177",
            "010101199003070017",
            "110101179003070017",
            "110101199013070017",
            "110101199003320017",
            "11010119900307001A",
            "11010119900307A017",
            "１１０１０１１９９００３０７００１７",
        ] {
            assert!(extract(candidate, today).is_none(), "accepted {candidate:?}");
        }
    }

    #[test]
    fn impossible_calendar_dates_yield_nothing() {
        assert!(extract("110101199002300017", date(2026, 1, 1)).is_none());
        assert!(extract("110101199102290017", date(2026, 1, 1)).is_none());
    }

    #[test]
    fn future_birth_dates_yield_nothing() {
        assert!(extract("110101209901010017", date(2026, 1, 1)).is_none());
    }

    #[test]
    fn extraction_is_deterministic() {
        let today = date(2026, 5, 20);
        let first = extract("110101199003070017", today);
        assert_eq!(first, extract("110101199003070017", today));
    }
}

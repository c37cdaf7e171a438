//! Historical timeframes and the date windows they cover.

use std::fmt;

use chrono::{Days, Months, NaiveDate};

/// Fixed set of historical ranges callers may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    /// Previous day to today
    OneDay,
    /// Last 7 days
    OneWeek,
    /// Last calendar month
    OneMonth,
    /// Last 3 calendar months
    ThreeMonths,
    /// Last 6 calendar months
    SixMonths,
    /// Last year
    OneYear,
    /// Last 5 years
    FiveYears,
    /// Everything the upstream keeps (20 years)
    All,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First day
    pub from: NaiveDate,
    /// Last day
    pub to: NaiveDate,
}

impl Timeframe {
    /// Used when a token is not recognised.
    pub const DEFAULT: Timeframe = Timeframe::OneMonth;

    /// All timeframes, shortest first.
    pub const ALL: [Timeframe; 8] = [
        Timeframe::OneDay,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
        Timeframe::ThreeMonths,
        Timeframe::SixMonths,
        Timeframe::OneYear,
        Timeframe::FiveYears,
        Timeframe::All,
    ];

    /// Parse a token, case-insensitively. `None` when unrecognised.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|tf| tf.token().eq_ignore_ascii_case(token))
    }

    /// Parse a token, falling back to [`Timeframe::DEFAULT`].
    pub fn parse(token: &str) -> Self {
        Self::from_token(token).unwrap_or(Self::DEFAULT)
    }

    /// Canonical token.
    pub fn token(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "1W",
            Timeframe::OneMonth => "1M",
            Timeframe::ThreeMonths => "3M",
            Timeframe::SixMonths => "6M",
            Timeframe::OneYear => "1Y",
            Timeframe::FiveYears => "5Y",
            Timeframe::All => "ALL",
        }
    }

    /// Window ending `today`.
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        let from = match self {
            Timeframe::OneDay => today.checked_sub_days(Days::new(1)),
            Timeframe::OneWeek => today.checked_sub_days(Days::new(7)),
            Timeframe::OneMonth => today.checked_sub_months(Months::new(1)),
            Timeframe::ThreeMonths => today.checked_sub_months(Months::new(3)),
            Timeframe::SixMonths => today.checked_sub_months(Months::new(6)),
            Timeframe::OneYear => today.checked_sub_months(Months::new(12)),
            Timeframe::FiveYears => today.checked_sub_months(Months::new(5 * 12)),
            Timeframe::All => today.checked_sub_months(Months::new(20 * 12)),
        };

        DateWindow {
            from: from.unwrap_or(NaiveDate::MIN),
            to: today,
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Timeframe::parse("1D"), Timeframe::OneDay);
        assert_eq!(Timeframe::parse("1w"), Timeframe::OneWeek);
        assert_eq!(Timeframe::parse(" 6m "), Timeframe::SixMonths);
        assert_eq!(Timeframe::parse("all"), Timeframe::All);
        assert_eq!(Timeframe::from_token("2Y"), None);
    }

    #[test]
    fn test_unknown_token_uses_default() {
        assert_eq!(Timeframe::parse("bogus"), Timeframe::OneMonth);
        assert_eq!(Timeframe::parse(""), Timeframe::DEFAULT);
    }

    #[test]
    fn test_token_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_token(tf.token()), Some(tf));
        }
    }

    #[test]
    fn test_windows() {
        let today = date(2024, 3, 31);

        assert_eq!(Timeframe::OneDay.window(today).from, date(2024, 3, 30));
        assert_eq!(Timeframe::OneWeek.window(today).from, date(2024, 3, 24));
        // Month arithmetic clamps to the last valid day
        assert_eq!(Timeframe::OneMonth.window(today).from, date(2024, 2, 29));
        assert_eq!(Timeframe::ThreeMonths.window(today).from, date(2023, 12, 31));
        assert_eq!(Timeframe::OneYear.window(today).from, date(2023, 3, 31));
        assert_eq!(Timeframe::All.window(today).from, date(2004, 3, 31));

        for tf in Timeframe::ALL {
            let window = tf.window(today);
            assert_eq!(window.to, today);
            assert!(window.from < window.to);
        }
    }
}

//! Front-month contract arithmetic.
//!
//! Computes the active contract code (e.g. `ESH26`) for a futures root
//! at a given date, using the per-root cycle and roll-day from the
//! static defaults table.

use chrono::{Datelike, NaiveDate};

use super::defaults::defaults_for;

/// CME month code for a calendar month (1-12).
#[must_use]
pub const fn month_code(month: u32) -> Option<char> {
    match month {
        1 => Some('F'),
        2 => Some('G'),
        3 => Some('H'),
        4 => Some('J'),
        5 => Some('K'),
        6 => Some('M'),
        7 => Some('N'),
        8 => Some('Q'),
        9 => Some('U'),
        10 => Some('V'),
        11 => Some('X'),
        12 => Some('Z'),
        _ => None,
    }
}

/// Next contract month in the cycle, with a year-increment flag.
const fn next_month(current: u32, quarterly: bool) -> (u32, bool) {
    if quarterly {
        match current {
            1 | 2 => (3, false),
            3..=5 => (6, false),
            6..=8 => (9, false),
            9..=11 => (12, false),
            _ => (3, true),
        }
    } else if current == 12 {
        (1, true)
    } else {
        (current + 1, false)
    }
}

/// Compute the front-month contract symbol for a root at `reference`.
///
/// Quarterly roots stay in the current delivery month until the
/// configured roll day, then advance to the next quarter. Monthly
/// roots trade the next month out and advance one further past the
/// roll day. Returns `None` for roots with no defaults entry.
#[must_use]
pub fn front_month_symbol(root: &str, reference: NaiveDate) -> Option<String> {
    let defaults = defaults_for(root)?;
    let mut month = reference.month();
    let mut year = reference.year();

    if defaults.quarterly {
        let in_delivery_quarter = matches!(month, 3 | 6 | 9 | 12);
        if !in_delivery_quarter || reference.day() >= defaults.roll_day {
            let (m, bump) = next_month(month, true);
            month = m;
            if bump {
                year += 1;
            }
        }
    } else if month == 12 && reference.day() >= defaults.roll_day {
        // December past the roll day goes straight to January.
        month = 1;
        year += 1;
    } else {
        // Monthly roots always trade at least one month out.
        let (m, bump) = next_month(month, false);
        month = m;
        if bump {
            year += 1;
        }
        if reference.day() >= defaults.roll_day {
            let (m, bump) = next_month(month, false);
            month = m;
            if bump {
                year += 1;
            }
        }
    }

    let code = month_code(month)?;
    Some(format!("{}{}{:02}", root.to_uppercase(), code, year % 100))
}

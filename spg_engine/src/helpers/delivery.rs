use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::Rng;

pub const MIN_DELIVERY_DAYS: u32 = 5;
pub const MAX_DELIVERY_DAYS: u32 = 7;

/// Moves `days` business days forward from `start`, skipping Saturdays and Sundays.
pub fn add_business_days(start: NaiveDate, days: u32) -> NaiveDate {
    let mut date = start;
    let mut remaining = days;
    while remaining > 0 {
        date = date + Days::new(1);
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    date
}

/// A customer-facing delivery estimate: a uniformly random 5 to 7 business days from `today`.
pub fn estimate_delivery_date(today: NaiveDate) -> NaiveDate {
    let days = rand::thread_rng().gen_range(MIN_DELIVERY_DAYS..=MAX_DELIVERY_DAYS);
    add_business_days(today, days)
}

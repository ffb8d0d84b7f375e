//! Monthly cost arithmetic behind the totals and ordering shown to the user.

use std::cmp::Ordering;

use crate::constants::MONTHS_PER_YEAR;
use crate::types::{Frequency, Subscription};

/// Monthly equivalent of a single subscription.
pub fn monthly_cost(record: &Subscription) -> f64 {
    match record.frequency {
        Frequency::Monthly => record.amount,
        Frequency::Yearly => record.amount / MONTHS_PER_YEAR,
    }
}

pub fn total_monthly(records: &[Subscription]) -> f64 {
    records.iter().map(monthly_cost).sum()
}

/// Copy of `records` ordered by monthly cost, most expensive first. Ties keep
/// insertion order.
pub fn sorted_by_monthly_cost(records: &[Subscription]) -> Vec<Subscription> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        monthly_cost(b)
            .partial_cmp(&monthly_cost(a))
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

pub fn format_currency(amount: f64) -> String {
    format!("{amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn record(name: &str, amount: f64, frequency: Frequency) -> Subscription {
        Subscription {
            id: name.to_lowercase(),
            name: name.into(),
            amount,
            frequency,
            renewal_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_total_mixes_monthly_and_yearly() {
        let records = vec![
            record("Gym", 12.0, Frequency::Monthly),
            record("Prime", 120.0, Frequency::Yearly),
        ];

        assert_eq!(format_currency(total_monthly(&records)), "22.00");
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(format_currency(total_monthly(&[])), "0.00");
    }

    #[test]
    fn test_sorted_descending_by_monthly_cost() {
        let records = vec![
            record("Five", 5.0, Frequency::Monthly),
            record("Twenty", 240.0, Frequency::Yearly),
            record("Ten", 10.0, Frequency::Monthly),
        ];

        let names: Vec<String> = sorted_by_monthly_cost(&records)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Twenty", "Ten", "Five"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let records = vec![
            record("First", 10.0, Frequency::Monthly),
            record("Second", 120.0, Frequency::Yearly),
        ];

        let sorted = sorted_by_monthly_cost(&records);
        assert_eq!(sorted[0].name, "First");
        assert_eq!(sorted[1].name, "Second");
    }
}

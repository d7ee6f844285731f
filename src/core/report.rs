//! Report aggregation over donation, payment and expense rows.
//!
//! Everything here is pure and cheap; callers recompute on every render from
//! whatever filtered view they are showing.

use super::donation::{DonationRecord, Purpose};
use std::borrow::Borrow;

/// Sum of donation amounts
#[must_use]
pub fn total_all<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a DonationRecord>,
{
    records.into_iter().map(|r| r.amount).sum()
}

/// Subtotal per purpose, in the order each purpose is first met.
///
/// Purposes with no records are left out rather than reported as zero.
#[must_use]
pub fn summary_by_purpose<'a, I>(records: I) -> Vec<(Purpose, f64)>
where
    I: IntoIterator<Item = &'a DonationRecord>,
{
    summarize_by(records, |r: &DonationRecord| r.purpose, |r: &DonationRecord| r.amount)
}

/// Groups `items` by `key`, summing `amount`, keeping first-seen key order.
#[must_use]
pub fn summarize_by<T, K, I>(
    items: I,
    key: impl Fn(&T) -> K,
    amount: impl Fn(&T) -> f64,
) -> Vec<(K, f64)>
where
    I: IntoIterator,
    I::Item: Borrow<T>,
    K: PartialEq,
{
    let mut totals: Vec<(K, f64)> = Vec::new();
    for item in items {
        let item: &T = item.borrow();
        let k = key(item);
        match totals.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, total)) => *total += amount(item),
            None => totals.push((k, amount(item))),
        }
    }
    totals
}

/// Formats pesos with thousands separators, e.g. `₱12,500.00` or `-₱25.50`.
#[must_use]
pub fn format_php(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}₱{grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::sample_record;

    fn with(purpose: Purpose, amount: f64) -> DonationRecord {
        let mut record = sample_record("1", "2025-01-01");
        record.purpose = purpose;
        record.amount = amount;
        record
    }

    #[test]
    fn test_total_all() {
        let records = vec![
            with(Purpose::GeneralFund, 100.0),
            with(Purpose::MassIntentions, 50.5),
        ];
        assert_eq!(total_all(&records), 150.5);
        assert_eq!(total_all(&Vec::<DonationRecord>::new()), 0.0);
    }

    #[test]
    fn test_summary_by_purpose_accumulates_in_encounter_order() {
        let a = Purpose::ParishDevelopment;
        let b = Purpose::CharityPrograms;
        let records = vec![with(a, 100.0), with(b, 50.0), with(a, 25.0)];

        let summary = summary_by_purpose(&records);
        assert_eq!(summary, vec![(a, 125.0), (b, 50.0)]);
    }

    #[test]
    fn test_summary_of_nothing_is_empty() {
        assert!(summary_by_purpose(&Vec::<DonationRecord>::new()).is_empty());
    }

    #[test]
    fn test_summary_accepts_filtered_views() {
        let records = vec![
            with(Purpose::GeneralFund, 10.0),
            with(Purpose::GeneralFund, 15.0),
        ];
        let view: Vec<&DonationRecord> = records.iter().collect();

        assert_eq!(summary_by_purpose(view.iter().copied()), vec![(Purpose::GeneralFund, 25.0)]);
    }

    #[test]
    fn test_summarize_by_arbitrary_keys() {
        let rows = vec![('A', 100.0), ('B', 50.0), ('A', 25.0)];
        let summary = summarize_by(&rows, |r: &(char, f64)| r.0, |r: &(char, f64)| r.1);
        assert_eq!(summary, vec![('A', 125.0), ('B', 50.0)]);
    }

    #[test]
    fn test_format_php() {
        assert_eq!(format_php(0.0), "₱0.00");
        assert_eq!(format_php(500.0), "₱500.00");
        assert_eq!(format_php(1234.5), "₱1,234.50");
        assert_eq!(format_php(12_500.0), "₱12,500.00");
        assert_eq!(format_php(1_000_000.0), "₱1,000,000.00");
        assert_eq!(format_php(-25.5), "-₱25.50");
    }
}

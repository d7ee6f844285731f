//! Donation form state, input masks and validation.
//!
//! The form holds raw text exactly as typed. Two fields are masked on every
//! edit (GCash number and amount); everything else is accepted verbatim and
//! checked only when the donor submits. Validation reports every problem at
//! once so each field can show its own message.

use super::donation::{
    DonationRecord, DonationStatus, IntentionType, Purpose, RecordId, round_to_cents,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Longest accepted GCash number
pub const GCASH_NUMBER_LEN: usize = 11;

// Patterns are literals; compiling them cannot fail.
#[allow(clippy::unwrap_used)]
static AMOUNT_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(\.\d{0,2})?)?$").unwrap());
#[allow(clippy::unwrap_used)]
static AMOUNT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").unwrap());
#[allow(clippy::unwrap_used)]
static GCASH_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{11}$").unwrap());

/// A form field, plus the `General` slot for errors not tied to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Date of the donation
    Date,
    /// Time of the donation
    Time,
    /// Donor full name
    FullName,
    /// Donor contact number
    ContactNumber,
    /// Donor email (optional)
    EmailAddress,
    /// Donor address (optional)
    HomeAddress,
    /// Donation amount
    Amount,
    /// Payment reference
    ReferenceNumber,
    /// GCash account number
    GcashNumber,
    /// Mass intention name (optional)
    IntentionName,
    /// Purpose of donation
    Purpose,
    /// Intention type
    IntentionType,
    /// Form-wide message
    General,
}

impl Field {
    /// Name of the field as used by the form markup
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Date => "dateOfDonation",
            Self::Time => "timeOfDonation",
            Self::FullName => "fullName",
            Self::ContactNumber => "contactNumber",
            Self::EmailAddress => "emailAddress",
            Self::HomeAddress => "homeAddress",
            Self::Amount => "donationAmount",
            Self::ReferenceNumber => "referenceNumber",
            Self::GcashNumber => "gcashNumber",
            Self::IntentionName => "nameOfPersons",
            Self::Purpose => "purposeOfDonation",
            Self::IntentionType => "intentionType",
            Self::General => "general",
        }
    }
}

/// Field to message. A field without an entry is valid.
pub type FieldErrors = BTreeMap<Field, String>;

/// Raw state of the donation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationForm {
    /// `YYYY-MM-DD`
    pub date_of_donation: String,
    /// `HH:MM`
    pub time_of_donation: String,
    /// Donor full name
    pub full_name: String,
    /// Donor contact number
    pub contact_number: String,
    /// Donor email
    pub email_address: String,
    /// Donor address
    pub home_address: String,
    /// Amount text, at most two decimals
    pub donation_amount: String,
    /// Payment reference
    pub reference_number: String,
    /// Digits only, at most 11
    pub gcash_number: String,
    /// Mass intention name
    pub name_of_persons: String,
    /// Purpose label
    pub purpose_of_donation: String,
    /// Intention type label
    pub intention_type: String,
    errors: FieldErrors,
}

impl Default for DonationForm {
    fn default() -> Self {
        Self {
            date_of_donation: String::new(),
            time_of_donation: String::new(),
            full_name: String::new(),
            contact_number: String::new(),
            email_address: String::new(),
            home_address: String::new(),
            donation_amount: String::new(),
            reference_number: String::new(),
            gcash_number: String::new(),
            name_of_persons: String::new(),
            purpose_of_donation: Purpose::MassIntentions.label().to_string(),
            intention_type: String::new(),
            errors: FieldErrors::new(),
        }
    }
}

impl DonationForm {
    /// A blank form with "Mass Intentions" preselected
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text of `field`
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Date => &self.date_of_donation,
            Field::Time => &self.time_of_donation,
            Field::FullName => &self.full_name,
            Field::ContactNumber => &self.contact_number,
            Field::EmailAddress => &self.email_address,
            Field::HomeAddress => &self.home_address,
            Field::Amount => &self.donation_amount,
            Field::ReferenceNumber => &self.reference_number,
            Field::GcashNumber => &self.gcash_number,
            Field::IntentionName => &self.name_of_persons,
            Field::Purpose => &self.purpose_of_donation,
            Field::IntentionType => &self.intention_type,
            Field::General => "",
        }
    }

    fn value_mut(&mut self, field: Field) -> Option<&mut String> {
        let slot = match field {
            Field::Date => &mut self.date_of_donation,
            Field::Time => &mut self.time_of_donation,
            Field::FullName => &mut self.full_name,
            Field::ContactNumber => &mut self.contact_number,
            Field::EmailAddress => &mut self.email_address,
            Field::HomeAddress => &mut self.home_address,
            Field::Amount => &mut self.donation_amount,
            Field::ReferenceNumber => &mut self.reference_number,
            Field::GcashNumber => &mut self.gcash_number,
            Field::IntentionName => &mut self.name_of_persons,
            Field::Purpose => &mut self.purpose_of_donation,
            Field::IntentionType => &mut self.intention_type,
            Field::General => return None,
        };
        Some(slot)
    }

    /// Applies one edit through the field's input mask.
    ///
    /// Returns `false` when the mask rejects the input; the form is then left
    /// untouched. An accepted edit clears the field's error.
    pub fn edit(&mut self, field: Field, input: &str) -> bool {
        let accepted = match field {
            Field::GcashNumber => filter_gcash_input(input),
            Field::Amount => filter_amount_input(input).then(|| input.to_string()),
            Field::General => None,
            _ => Some(input.to_string()),
        };
        let Some(value) = accepted else {
            return false;
        };
        let Some(slot) = self.value_mut(field) else {
            return false;
        };
        *slot = value;
        self.errors.remove(&field);
        true
    }

    /// Errors currently shown on the form
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Error currently shown for `field`
    #[must_use]
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Replaces all displayed errors
    pub fn set_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Shows a form-wide message, keeping field values intact
    pub fn set_general_error(&mut self, message: impl Into<String>) {
        self.errors.insert(Field::General, message.into());
    }

    /// Clears every field and error back to a fresh form
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Mask for the GCash number: digits only, at most 11.
///
/// Returns the digits to store, or `None` to reject the keystroke.
#[must_use]
pub fn filter_gcash_input(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    (digits.len() <= GCASH_NUMBER_LEN).then_some(digits)
}

/// Mask for the amount: digits, an optional point, up to two decimals.
#[must_use]
pub fn filter_amount_input(input: &str) -> bool {
    AMOUNT_INPUT.is_match(input)
}

/// Parses a form date (`YYYY-MM-DD`)
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

/// Parses a form time (`HH:MM`, seconds tolerated)
#[must_use]
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .ok()
}

fn parse_amount(input: &str) -> Option<f64> {
    let input = input.trim();
    if !AMOUNT_VALUE.is_match(input) {
        return None;
    }
    input
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

#[derive(Default)]
struct Checked {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    amount: Option<f64>,
    purpose: Option<Purpose>,
    intention_type: Option<IntentionType>,
}

fn require(errors: &mut FieldErrors, form: &DonationForm, field: Field, message: &str) -> bool {
    if form.value(field).is_empty() {
        errors.insert(field, message.to_string());
        false
    } else {
        true
    }
}

fn check(form: &DonationForm) -> (FieldErrors, Checked) {
    let mut errors = FieldErrors::new();
    let mut checked = Checked::default();

    if require(&mut errors, form, Field::Date, "Date is required") {
        checked.date = parse_date(&form.date_of_donation);
        if checked.date.is_none() {
            errors.insert(Field::Date, "Enter a valid date (YYYY-MM-DD)".to_string());
        }
    }
    if require(&mut errors, form, Field::Time, "Time is required") {
        checked.time = parse_time(&form.time_of_donation);
        if checked.time.is_none() {
            errors.insert(Field::Time, "Enter a valid time (HH:MM)".to_string());
        }
    }
    require(&mut errors, form, Field::FullName, "Full name is required");
    require(&mut errors, form, Field::ContactNumber, "Contact number is required");

    checked.amount = parse_amount(&form.donation_amount);
    if checked.amount.is_none() {
        errors.insert(Field::Amount, "Enter valid donation amount".to_string());
    }

    require(&mut errors, form, Field::ReferenceNumber, "Reference number is required");

    if require(&mut errors, form, Field::Purpose, "Purpose is required") {
        checked.purpose = Purpose::from_label(form.purpose_of_donation.trim());
        if checked.purpose.is_none() {
            errors.insert(Field::Purpose, "Select a valid purpose".to_string());
        }
    }
    if require(&mut errors, form, Field::IntentionType, "Intention type is required") {
        checked.intention_type = IntentionType::from_label(form.intention_type.trim());
        if checked.intention_type.is_none() {
            errors.insert(Field::IntentionType, "Select a valid intention type".to_string());
        }
    }

    if !GCASH_NUMBER.is_match(&form.gcash_number) {
        errors.insert(
            Field::GcashNumber,
            "GCash number must be exactly 11 digits".to_string(),
        );
    }

    (errors, checked)
}

/// Checks every rule and returns all violations.
#[must_use]
pub fn validate(form: &DonationForm) -> FieldErrors {
    check(form).0
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Turns a valid form into a completed record.
///
/// # Errors
/// Returns the validation errors when the form is not valid.
pub fn build_record(
    form: &DonationForm,
    id: RecordId,
    created_at: DateTime<Utc>,
) -> Result<DonationRecord, FieldErrors> {
    let (errors, checked) = check(form);
    if !errors.is_empty() {
        return Err(errors);
    }
    let (Some(date), Some(time), Some(amount), Some(purpose), Some(intention_type)) = (
        checked.date,
        checked.time,
        checked.amount,
        checked.purpose,
        checked.intention_type,
    ) else {
        return Err(errors);
    };

    Ok(DonationRecord {
        id,
        created_at,
        scheduled_date: date,
        scheduled_time: time,
        full_name: form.full_name.clone(),
        contact_number: form.contact_number.clone(),
        email_address: optional(&form.email_address),
        home_address: optional(&form.home_address),
        amount: round_to_cents(amount),
        reference_number: form.reference_number.clone(),
        gcash_number: form.gcash_number.clone(),
        intention_name: optional(&form.name_of_persons),
        purpose,
        intention_type,
        status: DonationStatus::Completed,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::filled_form;

    const REQUIRED: [Field; 9] = [
        Field::Date,
        Field::Time,
        Field::FullName,
        Field::ContactNumber,
        Field::Amount,
        Field::ReferenceNumber,
        Field::GcashNumber,
        Field::Purpose,
        Field::IntentionType,
    ];

    #[test]
    fn test_filled_form_is_valid() {
        assert!(validate(&filled_form()).is_empty());
    }

    #[test]
    fn test_blank_form_reports_every_required_field() {
        let mut form = DonationForm::new();
        form.purpose_of_donation.clear();

        let errors = validate(&form);
        let keys: Vec<Field> = errors.keys().copied().collect();
        assert_eq!(keys.len(), REQUIRED.len());
        for field in REQUIRED {
            assert!(errors.contains_key(&field), "missing error for {field:?}");
        }
    }

    #[test]
    fn test_each_missing_field_is_reported_alone() {
        for field in REQUIRED {
            let mut form = filled_form();
            *form.value_mut(field).unwrap() = String::new();

            let errors = validate(&form);
            let keys: Vec<Field> = errors.keys().copied().collect();
            assert_eq!(keys, vec![field], "clearing {field:?}");
        }
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let mut form = filled_form();
        form.email_address.clear();
        form.home_address.clear();
        form.name_of_persons.clear();
        assert!(validate(&form).is_empty());
    }

    #[test]
    fn test_whitespace_counts_as_filled_in() {
        let mut form = filled_form();
        form.full_name = "   ".to_string();
        form.contact_number = " ".to_string();
        form.reference_number = "\t".to_string();
        assert!(validate(&form).is_empty());

        form.name_of_persons = "  ".to_string();
        let record = build_record(&form, RecordId::new("1"), Utc::now()).unwrap();
        assert_eq!(record.full_name, "   ");
        assert_eq!(record.intention_name.as_deref(), Some("  "));
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut form = filled_form();
        for bad in ["0", "0.00", ".", "abc", "-5", "1e3", "inf"] {
            form.donation_amount = bad.to_string();
            let errors = validate(&form);
            assert_eq!(
                errors.get(&Field::Amount).map(String::as_str),
                Some("Enter valid donation amount"),
                "amount {bad:?}"
            );
        }
        form.donation_amount = "5.".to_string();
        assert!(validate(&form).is_empty());
    }

    #[test]
    fn test_gcash_number_must_be_exactly_eleven_digits() {
        let mut form = filled_form();
        for bad in ["0917123456", "091712345678", "0917-123-456", ""] {
            form.gcash_number = bad.to_string();
            assert!(validate(&form).contains_key(&Field::GcashNumber), "{bad:?}");
        }
    }

    #[test]
    fn test_format_errors_for_date_time_and_choices() {
        let mut form = filled_form();
        form.date_of_donation = "01/01/2025".to_string();
        form.time_of_donation = "10am".to_string();
        form.purpose_of_donation = "Bingo".to_string();
        form.intention_type = "Graduation".to_string();

        let errors = validate(&form);
        assert_eq!(errors[&Field::Date], "Enter a valid date (YYYY-MM-DD)");
        assert_eq!(errors[&Field::Time], "Enter a valid time (HH:MM)");
        assert_eq!(errors[&Field::Purpose], "Select a valid purpose");
        assert_eq!(errors[&Field::IntentionType], "Select a valid intention type");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_gcash_mask_keeps_digits_only() {
        let inputs = [
            "0917 123 4567",
            "abc",
            "0917-123-4567x",
            "+63 917 123 45678",
            "",
            "१२३",
        ];
        for input in inputs {
            let mut form = DonationForm::new();
            form.edit(Field::GcashNumber, input);
            assert!(form.gcash_number.chars().all(|c| c.is_ascii_digit()));
            assert!(form.gcash_number.len() <= GCASH_NUMBER_LEN);
        }
    }

    #[test]
    fn test_gcash_mask_rejects_twelfth_digit() {
        let mut form = DonationForm::new();
        assert!(form.edit(Field::GcashNumber, "09171234567"));
        assert!(!form.edit(Field::GcashNumber, "091712345678"));
        assert_eq!(form.gcash_number, "09171234567");
    }

    #[test]
    fn test_amount_mask() {
        let mut form = DonationForm::new();
        assert!(form.edit(Field::Amount, "500"));
        assert!(form.edit(Field::Amount, "500."));
        assert!(form.edit(Field::Amount, "500.25"));
        assert!(!form.edit(Field::Amount, "500.255"));
        assert!(!form.edit(Field::Amount, "5a"));
        assert!(!form.edit(Field::Amount, "1.2.3"));
        assert_eq!(form.donation_amount, "500.25");
        assert!(form.edit(Field::Amount, ""));
        assert_eq!(form.donation_amount, "");
    }

    #[test]
    fn test_amount_mask_only_stores_decimal_text() {
        let inputs = ["12", "12.3", "x", "-1", " 1", "1,000", "0.001", "..", ""];
        for input in inputs {
            let mut form = DonationForm::new();
            form.edit(Field::Amount, input);
            assert!(AMOUNT_INPUT.is_match(&form.donation_amount), "{input:?}");
        }
    }

    #[test]
    fn test_edit_clears_field_error() {
        let mut form = DonationForm::new();
        form.set_errors(validate(&form));
        assert!(form.error(Field::FullName).is_some());

        form.edit(Field::FullName, "M");
        assert!(form.error(Field::FullName).is_none());
        assert!(form.error(Field::Date).is_some());
    }

    #[test]
    fn test_rejected_edit_keeps_error() {
        let mut form = DonationForm::new();
        form.set_errors(validate(&form));

        assert!(!form.edit(Field::Amount, "abc"));
        assert!(form.error(Field::Amount).is_some());
    }

    #[test]
    fn test_build_record_from_valid_form() {
        let form = filled_form();
        let now = Utc::now();

        let record = build_record(&form, RecordId::new("42"), now).unwrap();
        assert_eq!(record.id.as_str(), "42");
        assert_eq!(record.created_at, now);
        assert_eq!(record.scheduled_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(record.scheduled_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(record.amount, 500.0);
        assert_eq!(record.purpose, Purpose::MassIntentions);
        assert_eq!(record.intention_type, IntentionType::Thanksgiving);
        assert_eq!(record.status, DonationStatus::Completed);
        assert_eq!(record.intention_name.as_deref(), Some("Juan Dela Cruz"));
        assert_eq!(record.email_address, None);
    }

    #[test]
    fn test_build_record_rejects_invalid_form() {
        let errors = build_record(&DonationForm::new(), RecordId::new("1"), Utc::now()).unwrap_err();
        assert!(errors.contains_key(&Field::FullName));
    }

    #[test]
    fn test_reset_restores_default_purpose() {
        let mut form = filled_form();
        form.set_general_error("boom");
        form.reset();
        assert_eq!(form, DonationForm::new());
        assert_eq!(form.purpose_of_donation, "Mass Intentions");
    }
}

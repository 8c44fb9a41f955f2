//! Submitted form fields and the invoice schema they are checked against.

use std::collections::HashMap;
use std::fmt;

use crate::models::InvoiceStatus;

/// Raw name/value pairs posted by an invoice form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy when assembling a submission by hand.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Invoice fields that passed validation. Create and update share this shape;
/// the identifier and date are never taken from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidInvoice {
    pub customer_id: String,
    /// Amount in currency units, as entered.
    pub amount: f64,
    pub status: InvoiceStatus,
}

impl ValidInvoice {
    /// The amount in whole cents, rounded to the nearest cent.
    pub fn amount_in_cents(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}

/// One problem with one submitted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Form field name as posted, e.g. `customerId`.
    pub field: &'static str,
    /// What is wrong with the value, phrased to follow the field name.
    pub message: String,
}

/// Every problem found in one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn field(&self, field: &str) -> Option<&FieldIssue> {
        self.issues.iter().find(|issue| issue.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid invoice form")?;
        for (index, issue) in self.issues.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{} {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// Largest amount whose cent value is still exactly representable.
const MAX_AMOUNT: f64 = 90_071_992_547_409.91;

/// Check `customerId`, `amount` and `status` of a submission.
///
/// `amount` is coerced the way a browser form number would be: surrounding
/// whitespace is ignored and a blank or absent value counts as zero. Anything
/// else must parse to a finite number.
pub fn validate_invoice(form: &FormData) -> Result<ValidInvoice, ValidationErrors> {
    let mut issues = Vec::new();

    let customer_id = match form.get("customerId") {
        None => {
            issues.push(issue("customerId", "is required"));
            None
        }
        Some(value) if value.trim().is_empty() => {
            issues.push(issue("customerId", "must not be empty"));
            None
        }
        Some(value) => Some(value.to_string()),
    };

    let amount = match coerce_number(form.get("amount")) {
        Some(amount) if amount.abs() <= MAX_AMOUNT => Some(amount),
        Some(_) => {
            issues.push(issue("amount", "is out of range"));
            None
        }
        None => {
            issues.push(issue("amount", "expected number, received nan"));
            None
        }
    };

    let status = match form.get("status") {
        Some(value) => match value.parse::<InvoiceStatus>() {
            Ok(status) => Some(status),
            Err(()) => {
                issues.push(issue(
                    "status",
                    &format!("expected 'pending' | 'paid', received '{value}'"),
                ));
                None
            }
        },
        None => {
            issues.push(issue("status", "is required"));
            None
        }
    };

    match (customer_id, amount, status) {
        (Some(customer_id), Some(amount), Some(status)) if issues.is_empty() => Ok(ValidInvoice {
            customer_id,
            amount,
            status,
        }),
        _ => Err(ValidationErrors { issues }),
    }
}

fn coerce_number(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn issue(field: &'static str, message: &str) -> FieldIssue {
    FieldIssue {
        field,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(customer: &str, amount: &str, status: &str) -> FormData {
        FormData::new()
            .with("customerId", customer)
            .with("amount", amount)
            .with("status", status)
    }

    #[test]
    fn accepts_a_complete_submission() {
        let invoice = validate_invoice(&form("c1", "12.50", "pending")).unwrap();
        assert_eq!(invoice.customer_id, "c1");
        assert_eq!(invoice.amount, 12.5);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.amount_in_cents(), 1250);
    }

    #[test]
    fn cents_round_to_nearest() {
        for (raw, cents) in [("0.29", 29), ("19.99", 1999), ("0.1", 10), (" 3 ", 300)] {
            let invoice = validate_invoice(&form("c1", raw, "paid")).unwrap();
            assert_eq!(invoice.amount_in_cents(), cents, "amount {raw}");
        }
    }

    #[test]
    fn blank_or_missing_amount_coerces_to_zero() {
        let blank = validate_invoice(&form("c1", "  ", "paid")).unwrap();
        assert_eq!(blank.amount, 0.0);

        let missing = FormData::new().with("customerId", "c1").with("status", "paid");
        assert_eq!(validate_invoice(&missing).unwrap().amount_in_cents(), 0);
    }

    #[test]
    fn rejects_non_numeric_and_non_finite_amounts() {
        for raw in ["abc", "12,50", "NaN", "inf"] {
            let err = validate_invoice(&form("c1", raw, "paid")).unwrap_err();
            assert!(err.field("amount").is_some(), "amount {raw}");
        }
        // Only decimal notation; hex and binary literals are not numbers here.
        for raw in ["0x10", "0b1"] {
            assert!(validate_invoice(&form("c1", raw, "paid")).is_err(), "amount {raw}");
        }
        let err = validate_invoice(&form("c1", "1e300", "paid")).unwrap_err();
        assert_eq!(err.field("amount").unwrap().message, "is out of range");
    }

    #[test]
    fn rejects_unknown_status() {
        let err = validate_invoice(&form("c1", "1", "overdue")).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(
            err.to_string(),
            "Invalid invoice form: status expected 'pending' | 'paid', received 'overdue'"
        );
    }

    #[test]
    fn collects_every_issue() {
        let err = validate_invoice(&FormData::new().with("amount", "x")).unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|issue| issue.field).collect();
        assert_eq!(fields, vec!["customerId", "amount", "status"]);

        let blank = validate_invoice(&form("   ", "1", "paid")).unwrap_err();
        assert_eq!(blank.field("customerId").unwrap().message, "must not be empty");
    }

    #[test]
    fn form_data_collects_from_pairs() {
        let data: FormData = [("customerId", "c9"), ("status", "paid")].into_iter().collect();
        assert_eq!(data.get("customerId"), Some("c9"));
        assert_eq!(data.get("amount"), None);
    }
}

//! Advance eligibility against payable commissions.
//!
//! The cap computed here is a convenience for the person filling the form;
//! the backend applies its own check when the advance is created.

use crate::error::{FieldErrors, Result};
use crate::model::{AdvancePayment, AdvanceStatus, NewAdvance, PaymentMethod};
use crate::money::Money;

/// Approved amount of advances already paid out and not yet recovered.
pub fn unrecovered_advances(advances: &[AdvancePayment]) -> Money {
    advances
        .iter()
        .filter(|a| a.status == AdvanceStatus::Paid)
        .map(|a| a.approved_amount)
        .sum()
}

/// Payable commission left once outstanding advances are netted off.
pub fn adjusted_payable(total_payable: Money, unrecovered: Money) -> Money {
    let net = total_payable - unrecovered;
    if net.is_negative() {
        Money::ZERO
    } else {
        net
    }
}

#[derive(Debug, Clone)]
pub struct AdvanceDraft {
    pub employee: String,
    pub amount: String,
    pub reason: String,
    pub method: PaymentMethod,
    pub reference: String,
}

impl AdvanceDraft {
    pub fn validate(&self, adjusted_payable: Money) -> Result<NewAdvance> {
        let mut errors = FieldErrors::new();

        let amount = match Money::parse_optional("amount", &self.amount) {
            Ok(None) => {
                errors.add("amount", "Amount is required");
                None
            }
            Err(_) => {
                errors.add("amount", "Enter a valid amount");
                None
            }
            Ok(Some(value)) if !value.is_positive() => {
                errors.add("amount", "Amount must be greater than zero");
                None
            }
            Ok(Some(value)) if value > adjusted_payable => {
                errors.add(
                    "amount",
                    format!(
                        "Amount cannot exceed available payable commission ({})",
                        adjusted_payable.grouped()
                    ),
                );
                None
            }
            Ok(Some(value)) => Some(value),
        };

        if self.reason.trim().is_empty() {
            errors.add("reason", "Reason is required");
        }
        if self.method.requires_reference() && self.reference.trim().is_empty() {
            errors.add(
                "payment_reference",
                format!("Reference is required for {} payments", self.method.label()),
            );
        }
        errors.into_result()?;

        Ok(NewAdvance {
            employee: self.employee.clone(),
            requested_amount: amount.unwrap_or(Money::ZERO),
            reason: self.reason.trim().to_string(),
            payment_method: self.method,
            payment_reference: self.reference.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(status: AdvanceStatus, approved: i64) -> AdvancePayment {
        AdvancePayment {
            id: format!("adv-{approved}"),
            employee: "e1".into(),
            employee_name: None,
            requested_amount: Money::new(approved, 0),
            approved_amount: Money::new(approved, 0),
            status,
            reason: "fuel".into(),
            payment_method: String::new(),
        }
    }

    fn draft(amount: &str, reason: &str) -> AdvanceDraft {
        AdvanceDraft {
            employee: "e1".into(),
            amount: amount.into(),
            reason: reason.into(),
            method: PaymentMethod::Cash,
            reference: String::new(),
        }
    }

    #[test]
    fn only_paid_advances_count_as_unrecovered() {
        let advances = [
            advance(AdvanceStatus::Paid, 150),
            advance(AdvanceStatus::Paid, 50),
            advance(AdvanceStatus::Approved, 400),
            advance(AdvanceStatus::Recovered, 75),
            advance(AdvanceStatus::Pending, 10),
        ];
        assert_eq!(unrecovered_advances(&advances), Money::new(200, 0));
    }

    #[test]
    fn cap_is_payable_minus_unrecovered() {
        let cap = adjusted_payable(Money::new(500, 0), Money::new(200, 0));
        assert_eq!(cap, Money::new(300, 0));

        let err = draft("301", "school fees").validate(cap).unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().get("amount"),
            Some("Amount cannot exceed available payable commission (300.00)")
        );

        let ok = draft("300", "school fees").validate(cap).unwrap();
        assert_eq!(ok.requested_amount, Money::new(300, 0));
    }

    #[test]
    fn cap_never_goes_negative() {
        assert_eq!(adjusted_payable(Money::new(100, 0), Money::new(250, 0)), Money::ZERO);
        let err = draft("1", "rent").validate(Money::ZERO).unwrap_err();
        assert!(err.field_errors().unwrap().contains("amount"));
    }

    #[test]
    fn reason_and_positive_amount_required() {
        let err = draft("0", "  ").validate(Money::new(100, 0)).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("amount"), Some("Amount must be greater than zero"));
        assert_eq!(fields.get("reason"), Some("Reason is required"));
    }

    #[test]
    fn bank_transfer_advances_need_a_reference() {
        let mut d = draft("50", "rent");
        d.method = PaymentMethod::BankTransfer;
        let err = d.validate(Money::new(100, 0)).unwrap_err();
        assert!(err.field_errors().unwrap().contains("payment_reference"));
    }
}

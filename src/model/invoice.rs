use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;

wire_enum! {
    pub enum InvoiceStatus : "invoice status" {
        Draft => "DRAFT",
        Sent => "SENT",
        Paid => "PAID",
        Overdue => "OVERDUE",
        Cancelled => "CANCELLED",
    }
}

impl InvoiceStatus {
    /// Text stamped diagonally across a printed invoice.
    pub fn watermark(&self) -> Option<&'static str> {
        match self {
            InvoiceStatus::Paid => Some("PAID"),
            InvoiceStatus::Overdue => Some("OVERDUE"),
            InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub job: String,
    #[serde(default)]
    pub job_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Money,
    #[serde(default)]
    pub tax_amount: Money,
    #[serde(default)]
    pub discount_amount: Money,
    pub total_amount: Money,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub terms_and_conditions: String,
}

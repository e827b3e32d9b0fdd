use serde::{Deserialize, Serialize};

use crate::money::Money;

wire_enum! {
    pub enum AdvanceStatus : "advance status" {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Paid => "PAID",
        Recovered => "RECOVERED",
        Cancelled => "CANCELLED",
    }
}

/// Per-employee commission totals as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub employee: String,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub total_available: Money,
    #[serde(default)]
    pub total_payable: Money,
    #[serde(default)]
    pub total_paid: Money,
    #[serde(default)]
    pub count_available: u32,
    #[serde(default)]
    pub count_payable: u32,
    #[serde(default)]
    pub count_paid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancePayment {
    pub id: String,
    pub employee: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    pub requested_amount: Money,
    #[serde(default)]
    pub approved_amount: Money,
    pub status: AdvanceStatus,
    #[serde(default)]
    pub reason: String,
    /// Blank until the advance is paid out.
    #[serde(default)]
    pub payment_method: String,
}

/// Body of create-advance-payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAdvance {
    pub employee: String,
    pub requested_amount: Money,
    pub reason: String,
    pub payment_method: crate::model::PaymentMethod,
    #[serde(default)]
    pub payment_reference: String,
}

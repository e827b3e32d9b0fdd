use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::money::Money;

wire_enum! {
    pub enum PaymentMethod : "payment method" {
        Cash => "CASH",
        Card => "CARD",
        MobileMoney => "MOBILE_MONEY",
        BankTransfer => "BANK_TRANSFER",
        Cheque => "CHEQUE",
        Credit => "CREDIT",
    }
}

impl PaymentMethod {
    /// Methods that leave a trail the shop must be able to quote back.
    pub fn requires_reference(&self) -> bool {
        match self {
            PaymentMethod::Card | PaymentMethod::BankTransfer | PaymentMethod::Cheque => true,
            PaymentMethod::Cash | PaymentMethod::MobileMoney | PaymentMethod::Credit => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Credit => "Credit",
        }
    }
}

wire_enum! {
    pub enum PaymentStatus : "payment status" {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Refunded => "REFUNDED",
    }
}

wire_enum! {
    pub enum TipStatus : "tip status" {
        Pending => "PENDING",
        Paid => "PAID",
        Cancelled => "CANCELLED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub job: String,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    #[serde(default)]
    pub reference_number: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub notes: String,
}

/// Body of create-payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub job: String,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    #[serde(default)]
    pub reference_number: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    #[serde(default)]
    pub receipt_number: String,
    pub job: String,
    #[serde(default)]
    pub job_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub payment: String,
    pub amount_paid: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub issued_by_name: Option<String>,
    #[serde(default)]
    pub issued_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tip {
    pub id: String,
    pub job: String,
    pub employee: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    pub amount: Money,
    pub status: TipStatus,
}

/// Body of create-tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTip {
    pub job: String,
    pub employee: String,
    pub amount: Money,
    #[serde(default)]
    pub notes: String,
}

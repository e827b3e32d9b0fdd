use serde::{Deserialize, Serialize};

use crate::money::Money;

wire_enum! {
    pub enum ExpenseStatus : "expense status" {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Paid => "PAID",
    }
}

impl Default for ExpenseStatus {
    fn default() -> Self {
        ExpenseStatus::Pending
    }
}

wire_enum! {
    /// Review actions a manager can take on an expense.
    pub enum ExpenseAction : "expense action" {
        Approve => "APPROVE",
        Reject => "REJECT",
        MarkPaid => "MARK_PAID",
    }
}

impl ExpenseAction {
    /// Route segment of the action endpoint.
    pub fn route(&self) -> &'static str {
        match self {
            ExpenseAction::Approve => "approve",
            ExpenseAction::Reject => "reject",
            ExpenseAction::MarkPaid => "mark_paid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub expense_number: String,
    #[serde(default)]
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub status: ExpenseStatus,
}

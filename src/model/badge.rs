use crate::model::{
    AdvanceStatus, ExpenseStatus, InvoiceStatus, JobStatus, PaymentStatus, TipStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Info,
    Progress,
    Success,
    Warning,
    Danger,
}

impl Tone {
    /// Fill colour used on printed documents.
    pub fn hex(&self) -> &'static str {
        match self {
            Tone::Neutral => "#6b7280",
            Tone::Info => "#2563eb",
            Tone::Progress => "#7c3aed",
            Tone::Success => "#16a34a",
            Tone::Warning => "#d97706",
            Tone::Danger => "#dc2626",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
    pub icon: &'static str,
}

impl Badge {
    const fn new(label: &'static str, tone: Tone, icon: &'static str) -> Self {
        Self { label, tone, icon }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.icon, self.label)
    }
}

/// Presentation of a status value. Implementations match exhaustively so a
/// new backend status cannot render without a decision here.
pub trait Badged {
    fn badge(&self) -> Badge;
}

impl Badged for JobStatus {
    fn badge(&self) -> Badge {
        match self {
            JobStatus::Draft => Badge::new("Draft", Tone::Neutral, "○"),
            JobStatus::Scheduled => Badge::new("Scheduled", Tone::Info, "◷"),
            JobStatus::InProgress => Badge::new("In Progress", Tone::Progress, "◐"),
            JobStatus::QualityCheck => Badge::new("Quality Check", Tone::Warning, "◎"),
            JobStatus::Completed => Badge::new("Completed", Tone::Success, "●"),
            JobStatus::Invoiced => Badge::new("Invoiced", Tone::Info, "▤"),
            JobStatus::Paid => Badge::new("Paid", Tone::Success, "✔"),
            JobStatus::Closed => Badge::new("Closed", Tone::Neutral, "■"),
            JobStatus::Cancelled => Badge::new("Cancelled", Tone::Danger, "✖"),
        }
    }
}

impl Badged for InvoiceStatus {
    fn badge(&self) -> Badge {
        match self {
            InvoiceStatus::Draft => Badge::new("Draft", Tone::Neutral, "○"),
            InvoiceStatus::Sent => Badge::new("Sent", Tone::Info, "➤"),
            InvoiceStatus::Paid => Badge::new("Paid", Tone::Success, "✔"),
            InvoiceStatus::Overdue => Badge::new("Overdue", Tone::Danger, "!"),
            InvoiceStatus::Cancelled => Badge::new("Cancelled", Tone::Neutral, "✖"),
        }
    }
}

impl Badged for PaymentStatus {
    fn badge(&self) -> Badge {
        match self {
            PaymentStatus::Pending => Badge::new("Pending", Tone::Warning, "◷"),
            PaymentStatus::Completed => Badge::new("Completed", Tone::Success, "✔"),
            PaymentStatus::Failed => Badge::new("Failed", Tone::Danger, "✖"),
            PaymentStatus::Refunded => Badge::new("Refunded", Tone::Neutral, "↺"),
        }
    }
}

impl Badged for TipStatus {
    fn badge(&self) -> Badge {
        match self {
            TipStatus::Pending => Badge::new("Pending", Tone::Warning, "◷"),
            TipStatus::Paid => Badge::new("Paid", Tone::Success, "✔"),
            TipStatus::Cancelled => Badge::new("Cancelled", Tone::Neutral, "✖"),
        }
    }
}

impl Badged for AdvanceStatus {
    fn badge(&self) -> Badge {
        match self {
            AdvanceStatus::Pending => Badge::new("Pending", Tone::Warning, "◷"),
            AdvanceStatus::Approved => Badge::new("Approved", Tone::Info, "✓"),
            AdvanceStatus::Rejected => Badge::new("Rejected", Tone::Danger, "✖"),
            AdvanceStatus::Paid => Badge::new("Paid", Tone::Success, "✔"),
            AdvanceStatus::Recovered => Badge::new("Recovered", Tone::Neutral, "↺"),
            AdvanceStatus::Cancelled => Badge::new("Cancelled", Tone::Neutral, "■"),
        }
    }
}

impl Badged for ExpenseStatus {
    fn badge(&self) -> Badge {
        match self {
            ExpenseStatus::Pending => Badge::new("Pending", Tone::Warning, "◷"),
            ExpenseStatus::Approved => Badge::new("Approved", Tone::Info, "✓"),
            ExpenseStatus::Rejected => Badge::new("Rejected", Tone::Danger, "✖"),
            ExpenseStatus::Paid => Badge::new("Paid", Tone::Success, "✔"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_job_status_has_a_distinct_label() {
        let mut labels: Vec<_> = JobStatus::ALL.iter().map(|s| s.badge().label).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), JobStatus::ALL.len());
    }

    #[test]
    fn overdue_invoices_render_as_danger() {
        assert_eq!(InvoiceStatus::Overdue.badge().tone, Tone::Danger);
        assert_eq!(InvoiceStatus::Paid.badge().to_string(), "✔ Paid");
    }
}

//! Read-only mirrors of the records owned by the shop backend.

/// Declares a backend choice field: serde uses the wire spelling, and the
/// enum gets `as_str`, `Display` and `FromStr` (case-insensitive, `-` or `_`).
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $kind:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::ShopError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| crate::error::ShopError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

mod asset;
mod badge;
mod commission;
mod expense;
mod invoice;
mod job;
mod payment;

pub use asset::Asset;
pub use badge::{Badge, Badged, Tone};
pub use commission::{AdvancePayment, AdvanceStatus, CommissionSummary, NewAdvance};
pub use expense::{Expense, ExpenseAction, ExpenseStatus};
pub use invoice::{Invoice, InvoiceStatus};
pub use job::{Job, JobLine, JobStatus};
pub use payment::{
    NewPayment, NewTip, Payment, PaymentMethod, PaymentStatus, Receipt, Tip, TipStatus,
};

use serde::Deserialize;

/// List endpoints answer either with a DRF page or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Page { results } => results,
            Listing::Plain(items) => items,
        }
    }
}

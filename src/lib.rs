pub mod api;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod model;
pub mod money;
pub mod rules;
pub mod settlement;

pub use api::{Backend, HttpBackend};
pub use cache::{QueryCache, QueryKey, QueryPattern};
pub use config::{Config, State};
pub use error::{FieldErrors, Result, ShopError};
pub use money::Money;
pub use settlement::{FileJournal, SettlementJournal, Settler};

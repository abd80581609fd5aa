pub mod calendar;
pub mod config;
pub mod contract;
pub mod decimal;
pub mod errors;
pub mod pipeline;
pub mod rent;
pub mod serialization;
pub mod types;

// re-export key types
pub use calendar::{parse_date, TermKey};
pub use config::{ContractChanges, ContractConfig, Expense, Property, PropertyAssignment};
pub use contract::{Contract, ContractBuilder};
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, LostPayment, Result};
pub use pipeline::compute_rent;
pub use rent::{Discount, LineItem, Payment, Rent, RentTotal, Settlement, Vat};
pub use serialization::{ContractView, PeriodOverview, RentView};
pub use types::{ContractId, ContractStatus, Frequency, Origin, PaymentStatus, PropertyId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

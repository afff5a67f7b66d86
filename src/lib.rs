pub mod amortization;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod loan;
pub mod store;
pub mod types;

// re-export key types
pub use amortization::{add_months, monthly_payment, AmortizationSchedule, Installment};
pub use decimal::{Money, Rate};
pub use errors::{EmiError, Result};
pub use events::{Event, EventStore};
pub use loan::{Loan, LoanBuilder};
pub use store::LoanStore;
pub use types::{LoanId, LoanStatus, PaymentRecord};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

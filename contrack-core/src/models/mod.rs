pub mod amendment;
pub mod contract;
pub mod payment;
pub mod period;

pub use amendment::{Amendment, AmendmentCategory, AmendmentKind, AmendmentsHistory, AmendmentsSummary};
pub use contract::{Contract, ContractWithCurrentInfo};
pub use payment::{FundingSource, Invoice, PaymentEntry, PaymentRecord, PaymentStatus};
pub use period::{Period, PeriodKind, PeriodStatus, PeriodSummary};

//! Return computations over a position timeline.

pub mod annualize;
pub mod hodl;
pub mod irr;
pub mod twr;

pub use annualize::{annualize, compound_annualize, period_days, simple_annualize};
pub use hodl::{HodlBenchmark, hodl_benchmark};
pub use irr::{CashFlowPoint, money_weighted_flows, sign_changes, solve_irr};
pub use twr::{SubPeriodReturn, TwrResult, chain_link, sub_period_return};

pub mod liquidity_event;
pub mod period;
pub mod priced_event;

// Re-export for easier access
pub use liquidity_event::{EventKind, LiquidityEvent};
pub use period::PositionPeriod;
pub use priced_event::{PriceSource, PricedEvent};

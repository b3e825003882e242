pub mod decimals;
pub mod holdings;
pub mod price;

pub use decimals::TokenDecimals;
pub use holdings::Holdings;
pub use price::Price;

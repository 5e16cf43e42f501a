//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary math runs on `Decimal` end to end; prices are stored as
//! decimals, so no float conversion ever enters the path.

use rust_decimal::Decimal;


/// Line total for one (price, quantity) pair, exact
pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

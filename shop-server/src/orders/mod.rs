//! Order lifecycle engine
//!
//! Placement, status transitions, cancellation and refund. Every stock
//! effect goes through the stock ledger; the manager only decides *when*
//! stock moves, never *how*.

mod manager;

pub use manager::OrdersManager;

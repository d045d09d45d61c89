//! Base types and error handling.
//!
//! Provides the foundational types shared by every layer:
//! - [`BrokerError`](brokererror::BrokerError): the error taxonomy for resolution, dialing and sending
//! - [`context`]: extension traits attaching endpoint/domain context to lower-level errors

pub mod brokererror;
pub mod context;

#[cfg(test)]
mod tests;

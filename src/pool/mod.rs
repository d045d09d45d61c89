//! Connection pooling and selection.
//!
//! - [`ConnectionPool`]: one slot per resolved endpoint, built by dialing each
//! - [`selector`]: injectable uniform random slot choice

mod connection_pool;
pub mod selector;

pub use connection_pool::ConnectionPool;
pub use selector::{pick_slot, IndexPicker, SeededPicker, ThreadRngPicker};

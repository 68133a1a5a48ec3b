//! In-memory work-order repository for tests and embedded use.

mod work_order;

pub use work_order::InMemoryWorkOrderRepository;

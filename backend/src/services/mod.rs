pub mod metrics;
pub mod notice_store;
pub mod sweeper;

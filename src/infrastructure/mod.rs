pub mod observability;
pub mod platform;
pub mod speech;
pub mod storage;

//! Business logic services

pub mod dispatch;
pub mod distance;
pub mod fleet;
pub mod loader;
pub mod parcel_store;
pub mod report;

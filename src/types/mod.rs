//! Type definitions

pub mod parcel;
pub mod route;
pub mod vehicle;

pub use parcel::*;
pub use route::*;
pub use vehicle::*;

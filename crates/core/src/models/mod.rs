pub mod common;
pub mod driver;
pub mod page;
pub mod sync;
pub mod vehicle;

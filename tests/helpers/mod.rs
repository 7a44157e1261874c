#![allow(unused_imports, dead_code)]
pub mod fleet_helpers;
pub mod test_db;

pub use fleet_helpers::*;
pub use test_db::*;

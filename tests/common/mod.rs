#![allow(dead_code, unused_imports)]

pub mod categories;
pub mod strategies;

pub use categories::*;
pub use strategies::*;

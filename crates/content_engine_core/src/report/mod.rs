//! Monthly reporting: aggregation of saved runs and the insight loop built
//! on top of it.

pub mod insight;
pub mod monthly;

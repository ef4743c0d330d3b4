pub mod serve;
pub mod set;

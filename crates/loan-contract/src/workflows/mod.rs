pub mod archive;
pub mod contract;
pub mod roster;

pub mod boot;
pub mod order;
pub mod providers;

pub mod check_region;
pub mod handlers;
pub mod sweep;

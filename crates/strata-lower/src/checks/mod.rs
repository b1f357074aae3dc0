//! Checks run on a file after every pass group
//!
//! Both report user-facing errors; the driver collects them for every file
//! instead of stopping at the first one.

mod implicit_interfaces;
mod name_clash;

pub use implicit_interfaces::check_implicit_interfaces;
pub use name_clash::check_name_clashes;

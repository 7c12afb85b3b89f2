//! Configuration sources, applied in precedence order.

pub mod environment;
pub mod global_file;
pub mod site_file;

pub mod base_arg;
pub mod batch_spec;
pub mod error;
pub mod execer;
pub mod progress;
pub mod sql_value;

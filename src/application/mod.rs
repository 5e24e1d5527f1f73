pub mod commands;
pub mod use_cases;

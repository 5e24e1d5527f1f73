pub mod rows_file;
pub mod sqlite_execer;

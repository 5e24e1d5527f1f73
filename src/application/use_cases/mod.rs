pub mod execute_batch;

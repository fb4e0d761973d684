//! Integration tests for cltool.
//!
//! These tests drive the built binary end to end and exercise the executor
//! through the public library API.

mod helpers;
mod test_batch_command;
mod test_cat_command;
mod test_checksum_command;
mod test_error_paths;
mod test_executor_ordering;
mod test_properties_command;

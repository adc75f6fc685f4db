pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{OptimizerError, OptimizerResult, ValidationError};
pub use validation::{validate_config, validate_input_path};
pub use formats::{OutputFormat, SizeUnit, format_file_size, format_from_extension};
pub use fs::{claim_unique_path, compressed_output_path, file_name, read_source, write_output};

pub mod fs;

pub use fs::{read_file, write_file, LoadedFile};

mod temp_files;

pub use temp_files::TempFileStore;

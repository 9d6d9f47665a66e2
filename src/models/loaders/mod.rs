pub mod dir_loader;

pub use dir_loader::load_files_from_dir;

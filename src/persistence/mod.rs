pub mod json_file;

pub mod alignment_file;
pub mod image_stack;
pub mod theta_file;

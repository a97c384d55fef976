pub mod comment;
pub mod file;

pub use comment::{ReviewComment, User};
pub use file::{ChangedFile, FileStatus};

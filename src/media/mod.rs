pub mod files;
pub mod mimetype;

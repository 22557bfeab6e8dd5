pub mod events;
pub mod grid;
pub mod init;
pub mod root;

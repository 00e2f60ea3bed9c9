pub mod folders;
pub mod pages;
pub mod pictures;
pub mod sessions;
pub mod videos;

pub mod insight;
pub mod interview;
pub mod resume;
pub mod roadmap;
pub mod user;

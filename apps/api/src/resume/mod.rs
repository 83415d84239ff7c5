pub mod ats;
pub mod handlers;
pub mod improve;
pub mod prompts;
pub mod store;

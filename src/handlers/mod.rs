pub mod check_ins;
pub mod entries;
pub mod health;
pub mod home;
pub mod prompts;
pub mod ws;

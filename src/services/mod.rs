pub mod check_in;
pub mod claude;
pub mod cta;
pub mod dates;
pub mod prompts;
pub mod streak;

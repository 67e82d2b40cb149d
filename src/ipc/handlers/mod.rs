pub mod cascade;
pub mod catalog;
pub mod core;
pub mod dashboard;
pub mod drafts;
pub mod purchases;
pub mod resources;
pub mod students;

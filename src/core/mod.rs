pub mod contact;
pub mod phone;
pub mod project;
pub mod tag;
pub mod task;
pub mod time_entry;

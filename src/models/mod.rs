pub mod pack;
pub mod person;
pub mod role;

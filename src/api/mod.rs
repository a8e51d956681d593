pub mod employee;
pub mod submission;

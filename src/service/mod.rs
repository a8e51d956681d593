pub mod employee;
pub mod input;

pub use employee::EmployeeService;
pub use input::EmployeeInput;

#[cfg(test)]
mod tests;

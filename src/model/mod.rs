pub mod role;
pub mod salary;
pub mod staff;

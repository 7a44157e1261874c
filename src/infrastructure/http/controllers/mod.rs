pub mod assignments;
pub mod health;

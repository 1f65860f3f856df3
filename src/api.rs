pub mod health;
pub mod tournament;

mod helper;

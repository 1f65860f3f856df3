//! Tournament submission and progression engine.
//!
//! The database-facing pieces take a `&mut PgConnection` so callers decide
//! the transaction boundary; `judge` and `verdict` never touch the database.

pub mod catalog;
pub mod completion;
pub mod gate;
pub mod judge;
pub mod leaderboard;
pub mod progression;
pub mod verdict;

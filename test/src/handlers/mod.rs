//! Route handlers of the board application.

pub mod boards;
pub mod pages;

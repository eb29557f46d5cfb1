//! Terminal front end

pub mod cli;

//! Library side of the `tsd` binary: argument types, commands, logging and
//! table output.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;

// Driver library for two-center jY integral runs

pub mod app;
pub mod config;
pub mod io;

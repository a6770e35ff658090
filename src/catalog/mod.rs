pub mod commands;
pub mod model;
pub mod pages;
pub mod queries;

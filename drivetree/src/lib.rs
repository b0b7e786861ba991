pub mod bootstrap;
pub mod category;
pub mod config;
pub mod index;
pub mod local;
pub mod logging;
pub mod remote;
pub mod upload;

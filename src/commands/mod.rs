pub mod build;
pub mod options;
pub mod watch;

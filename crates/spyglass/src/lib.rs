pub mod app;
pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod report;
pub mod request;

pub use app::{run, Failure, Options, Outcome, Stage};
pub use config::DeploymentConfig;
pub use env::RunContext;
pub use error::{ConfigurationError, Error};

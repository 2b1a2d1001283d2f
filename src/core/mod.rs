pub mod backup;
pub mod config;
pub mod docker;

pub use backup::BackupManager;
pub use config::InstanceConfig;
pub use docker::DockerManager;

// Infrastructure layer - External dependencies and adapters
pub mod azure_client;
pub mod config;
pub mod logging;

pub mod append_file;
pub mod client_factory;
pub mod cloud_url;
pub mod command;
pub mod list_cloud_box;
pub mod options;
pub mod progress;
pub mod retry;

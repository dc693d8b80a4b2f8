pub mod deploy;

pub use deploy::handle_deploy_command;

mod database;
mod in_process_worker;
mod state_builder;

pub use database::connect_and_migrate;
pub use in_process_worker::spawn_in_process_worker;
pub use state_builder::build_app_services;

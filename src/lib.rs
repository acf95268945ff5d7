pub mod config_store;
pub mod desktop;
pub mod errors;
pub mod launcher;
pub mod materialize;
pub mod output;
pub mod platform;
pub mod process;
pub mod provision;
pub mod releases;
pub mod settings;
pub mod supervisor;

#[cfg(test)]
mod release_fixture;

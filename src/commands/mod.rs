//! Command handlers for quickrec.
//!
//! # Commands
//! - `record`: record with the live waveform (default)
//! - `list`: browse, play and delete recordings
//! - `play`: play a recording or audio file with a waveform preview
//! - `delete`: delete a recording by index
//! - `config`: open the config file in an editor
//! - `list_devices`: list audio input devices
//! - `logs`: show recent log lines

pub mod config;
pub mod delete;
pub mod list;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;

pub use config::handle_config;
pub use delete::handle_delete;
pub use list::handle_list;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;

//! catbox-core - Core library for the catbox CLI
//!
//! Client for the catbox.moe upload API: permanent uploads, temporary
//! Litterbox uploads, album management and file deletion.

pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod form;
pub mod shortcode;
pub mod target;
pub mod transport;

// Re-export commonly used types
pub use client::CatboxClient;
pub use config::{
    config_exists, get_config_dir, get_config_path, load_config, load_config_from, save_config,
    save_config_to, validate_config,
};
pub use config::{AdvancedConfig, CatboxConfig, ClientConfig, ConfigFile, LoggingConfig};
pub use duration::LitterboxDuration;
pub use error::{Error, Result, UploadFailure};
pub use form::{FileBody, FilePart, FormField, UploadForm};
pub use shortcode::{album_shortcode, extract_shortcode, file_identifiers, validate_shortcode};
pub use target::UploadTarget;
pub use transport::{RawResponse, ReqwestTransport, Transport};

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod types;

pub use config::Config;
pub use error::TipTallyError;
pub use fingerprint::ContentFingerprint;
pub use types::*;

pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod settings;
pub mod state;
pub mod status;

pub use color::{hsv_to_rgb_spectrum, Rgb};
pub use config::{LightConfig, NetworkConfig, PwmHardwareConfig};
pub use controller::{LedController, RgbOutput};
pub use error::{OutputError, StorageError};
pub use protocol::{dispatch, parse_query, QueryParams, Reply, Route};
pub use settings::{SaveOutcome, SettingsStore, StorageVolume};
pub use state::ColorState;
pub use status::StatusSlot;

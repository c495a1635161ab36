pub mod boxes;
pub mod caps;
pub mod config;
pub mod engine;
pub mod error;
pub mod marshal;
pub mod parser;
pub mod session;
pub mod source;
pub mod tags;
pub mod topology;
pub mod util;
pub mod value;

pub use config::{ConfigError, ProbeConfig};
pub use engine::mp4::Mp4EngineFactory;
pub use engine::{DiscoveryStatus, EngineFactory};
pub use error::{ArgumentError, ProbeError};
pub use marshal::marshal;
pub use session::{
    Completion, DurationHms, ProbeOutcome, ProbeResult, ProbeSession, ProbeTask, Prober, init, probe,
};
pub use topology::{StreamKind, StreamNode};
pub use value::{TypedValue, ValueMap};

//! Minimal prelude for SDK consumers.

pub use crate::config::{globe_config, GlobeConfig, LocationConfig, LocationMode, ModelConfig};
pub use crate::data::{DataSource, FlowState, LoaderCommand, LoaderEvent, VisitorLocation};
pub use crate::geo::{Connection, GeoPoint};
pub use crate::scene::{GlobeSettings, MarkerStyle};
pub use crate::sdk::GlobeExplorerBuilder;

mod channel;
pub mod flow;
pub mod geolocation;
mod model;
pub mod source;
pub mod token_gate;
pub mod wallet;

pub use channel::{spawn_loader, LoaderChannel};
pub use flow::FlowState;
pub use model::{
    parse_connections, parse_points, LoadError, LoaderCommand, LoaderEvent, VisitorLocation,
};
pub use source::DataSource;

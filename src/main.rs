//! Geosphere: interactive globe of points and connections. Runs the globe_explorer app.

use bevy::prelude::*;
use globe_explorer::sdk::GlobeExplorerBuilder;

fn main() -> AppExit {
    let _ = dotenvy::dotenv();
    GlobeExplorerBuilder::new().build().run()
}

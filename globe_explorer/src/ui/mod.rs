mod alert;
mod hud;
mod tooltip;

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin};

use crate::camera::PointerOverUi;
use crate::scene::AlertState;

pub use alert::alert_plugin;
pub use hud::{hud_plugin, ActiveLocationMode};
pub use tooltip::tooltip_plugin;

/// egui setup shared by every overlay. Alerts are always on.
pub fn ui_plugin(app: &mut App) {
    app.add_plugins(EguiPlugin)
        .add_plugins(alert_plugin)
        .init_resource::<PointerOverUi>()
        .add_systems(Update, track_pointer_over_ui);
}

/// An open alert blocks the scene as well as the area under egui panels.
fn track_pointer_over_ui(
    mut contexts: EguiContexts,
    alert: Res<AlertState>,
    mut over: ResMut<PointerOverUi>,
) {
    let ctx = contexts.ctx_mut();
    over.0 = alert.message.is_some() || ctx.is_pointer_over_area() || ctx.wants_pointer_input();
}

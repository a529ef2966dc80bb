//! Blocking alert window for wallet and token-gate failures.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::scene::AlertState;

pub fn alert_plugin(app: &mut App) {
    app.init_resource::<AlertState>()
        .add_systems(Update, alert_system);
}

fn alert_system(mut contexts: EguiContexts, mut alert: ResMut<AlertState>) {
    let Some(message) = alert.message.as_deref() else {
        return;
    };

    let mut dismissed = false;
    egui::Window::new("Notice")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .resizable(false)
        .collapsible(false)
        .frame(
            egui::Frame::default()
                .fill(egui::Color32::from_rgba_premultiplied(30, 15, 20, 235))
                .inner_margin(egui::Margin::same(16))
                .corner_radius(egui::CornerRadius::same(6)),
        )
        .show(contexts.ctx_mut(), |ui| {
            ui.label(
                egui::RichText::new(message)
                    .monospace()
                    .color(egui::Color32::from_rgb(240, 200, 200)),
            );
            ui.add_space(8.0);
            dismissed = ui.button("OK").clicked();
        });

    if dismissed {
        alert.message = None;
    }
}

//! HUD overlay: globe counters, location flow, FPS, and key hints.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::LocationMode;
use crate::data::{FlowState, LoaderChannel, LoaderCommand};
use crate::scene::{AlertState, GlobeStats, LocationFlowStatus};

/// Location mode the app was started with; decides whether the wallet button shows.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct ActiveLocationMode(pub LocationMode);

pub fn hud_plugin(app: &mut App) {
    app.add_plugins(FrameTimeDiagnosticsPlugin)
        .init_resource::<ActiveLocationMode>()
        .add_systems(Update, hud_overlay_system);
}

/// Whether the "Connect wallet" button accepts clicks.
pub fn wallet_button_enabled(state: FlowState, alert_open: bool) -> bool {
    !alert_open && !state.is_busy()
}

fn hud_overlay_system(
    mut contexts: EguiContexts,
    stats: Res<GlobeStats>,
    flow: Res<LocationFlowStatus>,
    alert: Res<AlertState>,
    mode: Res<ActiveLocationMode>,
    channel: Res<LoaderChannel>,
    diagnostics: Res<DiagnosticsStore>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
        .unwrap_or(0.0);

    egui::Window::new("Globe Explorer")
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .frame(
            egui::Frame::default()
                .fill(egui::Color32::from_rgba_premultiplied(15, 15, 25, 210))
                .inner_margin(egui::Margin::same(12))
                .corner_radius(egui::CornerRadius::same(6)),
        )
        .show(contexts.ctx_mut(), |ui| {
            ui.style_mut().override_text_style = Some(egui::TextStyle::Monospace);
            ui.visuals_mut().override_text_color = Some(egui::Color32::from_rgb(200, 220, 240));

            ui.label(
                egui::RichText::new("Globe")
                    .size(16.0)
                    .color(egui::Color32::from_rgb(100, 220, 180)),
            );
            ui.add_space(4.0);

            ui.label(format!("Points       {}", stats.points));
            ui.label(format!("Connections  {}", stats.connections));
            ui.label(format!("Located      {}", stats.located));
            ui.label(format!("Unknown      {}", stats.unknown));

            if mode.0 == LocationMode::TokenGated {
                ui.add_space(4.0);
                ui.separator();
                ui.label(format!("Wallet  {}", flow.state));
                let enabled = wallet_button_enabled(flow.state, alert.message.is_some());
                if ui
                    .add_enabled(enabled, egui::Button::new("Connect wallet"))
                    .clicked()
                {
                    channel.request(LoaderCommand::ConnectWallet);
                }
            }

            ui.add_space(4.0);
            ui.separator();
            ui.label(format!("FPS  {fps:.0}"));
            ui.label(
                egui::RichText::new("drag rotate | scroll zoom\nV arcs | R reset")
                    .size(11.0)
                    .color(egui::Color32::from_rgb(130, 140, 160)),
            );
        });
}

use eframe::egui;

use super::components::*;
use super::logging::{append_bounded, drain_new_entries, init_logging};
use super::models::CowwyGui;

fn apply_dark_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.visuals.override_text_color = Some(egui::Color32::from_gray(220));
    style.visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(40, 40, 40);
    style.visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(50, 50, 50);
    style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(60, 60, 60);
    style.visuals.widgets.active.bg_fill = egui::Color32::from_rgb(70, 70, 70);
    style.visuals.panel_fill = egui::Color32::from_rgb(30, 30, 30);
    style.visuals.window_fill = egui::Color32::from_rgb(25, 25, 25);
    style.visuals.extreme_bg_color = egui::Color32::from_rgb(20, 20, 20);
    ctx.set_style(style);
}

impl CowwyGui {
    fn collect_logs(&mut self) -> bool {
        let new_messages = drain_new_entries();
        if new_messages.is_empty() {
            return false;
        }
        if let Ok(mut logs) = self.log_messages.lock() {
            append_bounded(&mut logs, new_messages);
        }
        true
    }
}

impl eframe::App for CowwyGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            init_logging();
            apply_dark_style(ctx);
        });

        self.start_with_default(ctx);
        self.poll_events(ctx);
        let has_new_logs = self.collect_logs();
        if has_new_logs || self.is_processing {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            HeaderComponent::render(ui, self);
            ui.add_space(5.0);
            StatusComponent::render(ui, self);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            FooterComponent::render(ui, self);
        });

        if self.show_logs {
            egui::SidePanel::right("log_panel")
                .resizable(true)
                .default_width(360.0)
                .show(ctx, |ui| {
                    LogPanelComponent::render(ui, self);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ComparisonComponent::render(ui, self);
                    ui.add_space(10.0);
                    DownloadComponent::render(ui, self);
                });
        });
    }
}

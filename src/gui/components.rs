use eframe::egui::{
    self, Align, Color32, Frame, Layout, ProgressBar, RichText, ScrollArea, TextureHandle, Ui,
};
use tracing::Level;

use super::logging::LogEntry;
use super::models::CowwyGui;
use crate::types::Stage;

const COMPONENT_HEIGHT: f32 = 80.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(255, 100, 100);
const OK_COLOR: Color32 = Color32::from_rgb(100, 200, 100);
const BUSY_COLOR: Color32 = Color32::from_rgb(255, 165, 0);

pub const INSTRUCTIONS: &str =
    "Upload an image to remove the background and download the fixed image.";

pub struct HeaderComponent;

impl HeaderComponent {
    pub fn render(ui: &mut Ui, app: &mut CowwyGui) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("COWWY")
                            .size(42.0)
                            .color(Color32::from_gray(220))
                            .strong(),
                    );
                    ui.label(
                        RichText::new(format!("v{} ", env!("CARGO_PKG_VERSION")))
                            .size(10.0)
                            .color(Color32::WHITE),
                    );
                });
                ui.label(
                    RichText::new("BACKGROUND REMOVER")
                        .size(12.0)
                        .color(Color32::from_gray(220))
                        .strong(),
                );
                ui.label(RichText::new(INSTRUCTIONS).color(Color32::from_gray(170)));
            });
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let enabled = !app.is_processing && app.pipeline.is_some();
                ui.add_enabled_ui(enabled, |ui| {
                    if ui
                        .button(RichText::new("Upload image").size(16.0).color(Color32::WHITE))
                        .clicked()
                    {
                        app.select_upload(ui.ctx());
                    }
                });
            });
        });
    }
}

pub struct StatusComponent;

impl StatusComponent {
    pub fn render(ui: &mut Ui, app: &mut CowwyGui) {
        Frame::NONE.inner_margin(0.0).show(ui, |ui| {
            ui.set_min_height(COMPONENT_HEIGHT * 0.5);

            if let Some(stage) = app.stage {
                let bar = ProgressBar::new(stage.fraction())
                    .show_percentage()
                    .animate(app.is_processing);
                ui.add(bar);
            }

            if let Some(text) = app.status_text() {
                let is_error = app.error_message.is_some() || app.startup_error.is_some();
                let color = if is_error {
                    ERROR_COLOR
                } else if matches!(app.stage, Some(Stage::Completed(_))) {
                    OK_COLOR
                } else if app.is_processing {
                    BUSY_COLOR
                } else {
                    Color32::from_gray(200)
                };
                ui.label(RichText::new(text).color(color).size(14.0));
            }
        });
    }
}

pub struct ComparisonComponent;

impl ComparisonComponent {
    pub fn render(ui: &mut Ui, app: &CowwyGui) {
        let Some(comparison) = &app.comparison else {
            return;
        };

        ui.columns(2, |columns| {
            Self::render_column(&mut columns[0], "Original Image", &comparison.original);
            Self::render_column(&mut columns[1], "Removed background Image", &comparison.processed);
        });
    }

    fn render_column(ui: &mut Ui, title: &str, texture: &TextureHandle) {
        ui.vertical_centered(|ui| {
            ui.heading(title);
            ui.add(egui::Image::new(texture).shrink_to_fit());
        });
    }
}

pub struct DownloadComponent;

impl DownloadComponent {
    pub fn render(ui: &mut Ui, app: &mut CowwyGui) {
        let Some(fixed) = &app.result else {
            return;
        };
        let label = format!(
            "{}{}",
            fixed.download.file_name,
            if fixed.from_cache { " (cached)" } else { "" }
        );

        ui.horizontal(|ui| {
            if ui.button("Download image with removed background").clicked() {
                if let Err(e) = app.save_download() {
                    tracing::error!("Failed to save download: {}", e);
                    app.error_message = Some(e.user_message());
                }
            }
            ui.label(RichText::new(label).color(Color32::from_gray(150)));
        });
    }
}

pub struct FooterComponent;

impl FooterComponent {
    pub fn render(ui: &mut Ui, app: &mut CowwyGui) {
        ui.horizontal(|ui| {
            let status_color = if app.is_processing { BUSY_COLOR } else { OK_COLOR };
            let timing_text = if app.is_processing {
                match app.processing_start_time {
                    Some(start_time) => format!("Processing: {:.2?}", start_time.elapsed()),
                    None => "Processing...".to_string(),
                }
            } else if let Some(fixed) = &app.result {
                format!("Last run: {:.2?}", fixed.elapsed)
            } else {
                "Ready".to_string()
            };
            ui.label(RichText::new(timing_text).color(status_color).size(14.0));

            ui.separator();
            let stats = app.cache.stats();
            ui.label(
                RichText::new(format!(
                    "Cache: {} entries, {} hits / {} misses",
                    stats.entries, stats.hits, stats.misses
                ))
                .size(12.0),
            );

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Save Logs").clicked() {
                    if let Err(e) = app.save_logs_to_file() {
                        tracing::error!("Failed to save logs: {}", e);
                    }
                }
                if ui.button("Clear Logs").clicked() {
                    if let Ok(mut logs) = app.log_messages.lock() {
                        logs.clear();
                    }
                }
                ui.toggle_value(&mut app.show_logs, "Logs");

                ui.add_enabled_ui(!app.is_processing, |ui| {
                    if ui.button("Load Preset").clicked() {
                        match app.load_preset() {
                            Ok(()) => app.error_message = None,
                            Err(e) => {
                                tracing::error!("Failed to load preset: {}", e);
                                app.error_message = Some(e.user_message());
                            }
                        }
                    }
                });
                if ui.button("Save Preset").clicked() {
                    if let Err(e) = app.save_preset() {
                        tracing::error!("Failed to save preset: {}", e);
                    }
                }
            });
        });
    }
}

pub struct LogPanelComponent;

impl LogPanelComponent {
    pub fn render(ui: &mut Ui, app: &mut CowwyGui) {
        ui.horizontal(|ui| {
            ui.label("Log Output");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.selectable_value(&mut app.min_log_level, Level::ERROR, "ERROR");
                ui.selectable_value(&mut app.min_log_level, Level::WARN, "WARN");
                ui.selectable_value(&mut app.min_log_level, Level::INFO, "INFO");
                ui.selectable_value(&mut app.min_log_level, Level::DEBUG, "DEBUG");
                ui.selectable_value(&mut app.min_log_level, Level::TRACE, "ALL");
            });
        });

        ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let Ok(logs) = app.log_messages.lock() else {
                    return;
                };
                if logs.is_empty() {
                    ui.label(RichText::new("No log messages").color(Color32::from_gray(120)));
                    return;
                }
                // Levels order ERROR < WARN < ... < TRACE, so ALL shows everything
                for entry in logs.iter().filter(|e| e.level <= app.min_log_level) {
                    ui.label(format_log_entry(entry));
                }
            });
    }
}

fn format_log_entry(entry: &LogEntry) -> RichText {
    let color = match entry.level {
        Level::ERROR => ERROR_COLOR,
        Level::WARN => Color32::from_rgb(255, 200, 100),
        Level::INFO => Color32::from_rgb(100, 200, 255),
        Level::DEBUG => Color32::from_rgb(150, 150, 150),
        Level::TRACE => Color32::from_rgb(100, 100, 100),
    };

    RichText::new(format!(
        "[{}] {} {}: {}",
        entry.timestamp, entry.level, entry.target, entry.message
    ))
    .color(color)
    .monospace()
}

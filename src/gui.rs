use std::sync::mpsc::{self, Receiver};

use eframe::egui;
use tracing::warn;

use crate::clicker::{AutoClicker, Status};
use crate::config::{Hotkey, MouseButton, Rate};
use crate::error::Result;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 120, 212);
const TRACK: egui::Color32 = egui::Color32::from_rgb(60, 60, 60);

fn custom_slider(ui: &mut egui::Ui, value: &mut u32, range: std::ops::RangeInclusive<u32>) -> bool {
    let desired_width = ui.available_width();
    let height = 20.0;
    let (response, painter) = ui.allocate_painter(
        egui::vec2(desired_width, height),
        egui::Sense::click_and_drag(),
    );

    let old_value = *value;
    let range_size = range.end() - range.start();

    if response.dragged() || response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let rect = response.rect;
            let normalized = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
            *value = range.start() + (normalized * range_size as f32).round() as u32;
        }
    }

    let rounding = egui::Rounding::same(8.0);
    painter.rect_filled(response.rect, rounding, TRACK);

    let fill_width = if range_size == 0 {
        response.rect.width()
    } else {
        response.rect.width() * (*value - range.start()) as f32 / range_size as f32
    };
    let fill_rect = egui::Rect::from_min_size(response.rect.left_top(), egui::vec2(fill_width, height));
    painter.rect_filled(fill_rect, rounding, ACCENT);

    old_value != *value
}

fn custom_radio_button(ui: &mut egui::Ui, selected: bool, text: &str) -> egui::Response {
    let (response, painter) = ui.allocate_painter(egui::vec2(80.0, 25.0), egui::Sense::click());

    let (bg_color, text_color) = if selected {
        (ACCENT, egui::Color32::WHITE)
    } else {
        (TRACK, egui::Color32::from_rgb(200, 200, 200))
    };
    painter.rect_filled(response.rect, egui::Rounding::same(6.0), bg_color);
    painter.text(
        response.rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(12.0),
        text_color,
    );

    response
}

fn apply_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let widgets = &mut style.visuals.widgets;
    widgets.noninteractive.bg_fill = egui::Color32::from_rgb(40, 40, 40);
    widgets.inactive.bg_fill = TRACK;
    widgets.hovered.bg_fill = egui::Color32::from_rgb(80, 80, 80);
    widgets.active.bg_fill = egui::Color32::from_rgb(100, 100, 100);
    for visuals in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        visuals.rounding = egui::Rounding::same(8.0);
    }
    ctx.set_style(style);
}

/// Control panel. Every edit goes through the [`AutoClicker`] API; status
/// changes come back over a channel, so click loop threads never touch UI
/// state.
pub struct AutoClickerApp {
    clicker: AutoClicker,
    status: Status,
    status_updates: Receiver<Status>,
    rate: u32,
    last_error: Option<String>,
}

impl AutoClickerApp {
    pub fn new(clicker: AutoClicker, ctx: &egui::Context) -> Self {
        apply_style(ctx);

        let (sender, status_updates) = mpsc::channel();
        let repaint = ctx.clone();
        clicker.on_status(move |status| {
            if sender.send(status).is_ok() {
                repaint.request_repaint();
            }
        });

        let status = clicker.status();
        Self {
            clicker,
            status,
            status_updates,
            rate: status.rate.get(),
            last_error: None,
        }
    }

    fn record(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, "control panel action failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn status_text(&self) -> String {
        if !self.status.active {
            return "Status: Stopped".to_string();
        }
        let mode = if self.status.hold_mode {
            "Holding".to_string()
        } else {
            format!("{} clicks/sec", self.status.rate)
        };
        format!("Status: Running ({}, {mode})", self.status.button)
    }
}

impl eframe::App for AutoClickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(status) = self.status_updates.try_recv() {
            self.status = status;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Auto Clicker");

            ui.add_space(10.0);

            // Rate
            ui.vertical(|ui| {
                ui.label("Clicks per second:");
                let mut changed = custom_slider(ui, &mut self.rate, Rate::MIN..=Rate::MAX);
                changed |= ui
                    .add(egui::DragValue::new(&mut self.rate).clamp_range(Rate::MIN..=Rate::MAX))
                    .changed();
                if changed {
                    let result = self.clicker.set_rate(self.rate);
                    self.record(result);
                }
            });

            ui.add_space(10.0);

            // Button
            ui.vertical(|ui| {
                ui.label("Mouse button:");
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    for (button, label) in [(MouseButton::Left, "Left"), (MouseButton::Right, "Right")] {
                        if custom_radio_button(ui, self.status.button == button, label).clicked() {
                            let result = self.clicker.set_button(button);
                            self.record(result);
                        }
                        ui.add_space(5.0);
                    }
                });
            });

            ui.add_space(10.0);

            let mut hold_mode = self.status.hold_mode;
            if ui.checkbox(&mut hold_mode, "Hold mode (keep button pressed)").changed() {
                let result = self.clicker.set_hold_mode(hold_mode);
                self.record(result);
            }

            ui.add_space(10.0);

            // Hotkey
            let mut hotkey = self.status.hotkey;
            egui::ComboBox::from_label("Hotkey")
                .selected_text(hotkey.to_string())
                .show_ui(ui, |ui| {
                    for choice in Hotkey::ALL {
                        ui.selectable_value(&mut hotkey, choice, choice.to_string());
                    }
                });
            if hotkey != self.status.hotkey {
                let result = self.clicker.set_hotkey(hotkey);
                self.record(result);
            }

            ui.add_space(10.0);

            let is_running = self.status.active;
            let toggle = egui::Button::new(if is_running { "Stop" } else { "Start" })
                .fill(if is_running { egui::Color32::from_rgb(200, 0, 0) } else { ACCENT });
            if ui.add(toggle).clicked() {
                let result = self.clicker.toggle();
                self.record(result);
            }

            ui.add_space(10.0);

            ui.label(self.status_text());
            if let Some(error) = &self.last_error {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), error);
            }

            ui.add_space(10.0);

            ui.label(format!("Press {} to toggle the clicker on/off", self.status.hotkey));
        });
    }
}

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Context;
use clap::Parser;
use cps_clicker::{spawn_listener, AutoClicker, AutoClickerApp, ClickerError, Options, RdevEmitter};
use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let options = Options::parse();

    let default_level = if options.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let settings = options.settings()?;
    info!(?settings, "starting auto clicker");

    let clicker = AutoClicker::with_settings(RdevEmitter::new(), settings);
    spawn_listener(clicker.handle(), options.combo_policy())
        .context("failed to start global hotkey listener")?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([280.0, 400.0])
            .with_resizable(false)
            .with_decorations(true),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Auto Clicker",
        native_options,
        Box::new(move |cc| Box::new(AutoClickerApp::new(clicker, &cc.egui_ctx))),
    )
    .map_err(|e| ClickerError::gui(e.to_string()))?;

    info!("control panel closed");
    Ok(())
}

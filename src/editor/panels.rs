//! Editor windows that only display state: hardware, about and the egui
//! style editor.

use crate::engine::context::EngineContext;

/// One toggleable editor window.
pub trait Panel {
    /// Window title, also the key of its visibility flag in the config.
    fn title(&self) -> &'static str;

    fn open_by_default(&self) -> bool {
        false
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &mut EngineContext);
}

#[derive(Default)]
pub struct HardwarePanel;

impl Panel for HardwarePanel {
    fn title(&self) -> &'static str {
        "Hardware"
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        egui::Grid::new("hardware_grid").num_columns(2).striped(true).show(ui, |ui| {
            ui.label("OS");
            ui.label(format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH));
            ui.end_row();
            ui.label("CPU threads");
            ui.label(cores.to_string());
            ui.end_row();
            ui.label("Worker threads");
            ui.label(rayon::current_num_threads().to_string());
            ui.end_row();
        });

        ui.separator();
        match &ctx.gpu {
            Some(gpu) => {
                egui::Grid::new("gpu_grid").num_columns(2).striped(true).show(ui, |ui| {
                    for (label, value) in [
                        ("GPU", gpu.adapter.as_str()),
                        ("Backend", gpu.backend.as_str()),
                        ("Type", gpu.device_type.as_str()),
                        ("Driver", gpu.driver.as_str()),
                        ("Driver info", gpu.driver_info.as_str()),
                    ] {
                        ui.label(label);
                        ui.label(value);
                        ui.end_row();
                    }
                    ui.label("Wireframe");
                    ui.label(if gpu.wireframe_supported { "supported" } else { "unsupported" });
                    ui.end_row();
                });
            }
            None => {
                ui.weak("No GPU (headless)");
            }
        }
    }
}

#[derive(Default)]
pub struct AboutPanel;

pub const LIBRARIES: &[(&str, &str)] = &[
    ("winit", "0.30"),
    ("wgpu", "0.20"),
    ("egui", "0.28"),
    ("glam", "0.27"),
    ("gltf", "1.4"),
    ("image", "0.25"),
    ("rayon", "1.8"),
    ("serde_json", "1.0"),
];

impl Panel for AboutPanel {
    fn title(&self) -> &'static str {
        "About"
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &mut EngineContext) {
        ui.heading(format!("{} {}", ctx.app.name, env!("CARGO_PKG_VERSION")));
        ui.label("A 3D engine built around modules and a game object tree.");
        ui.label(format!("By {}", ctx.app.organization));
        ui.separator();

        ui.strong("Libraries");
        for (name, version) in LIBRARIES {
            ui.label(format!("{} {}", name, version));
        }
        ui.separator();
        ui.label("MIT License");
    }
}

#[derive(Default)]
pub struct UiSettingsPanel;

impl Panel for UiSettingsPanel {
    fn title(&self) -> &'static str {
        "UI Settings"
    }

    fn show(&mut self, ui: &mut egui::Ui, _ctx: &mut EngineContext) {
        let egui_ctx = ui.ctx().clone();
        egui::ScrollArea::vertical().show(ui, |ui| egui_ctx.style_ui(ui));
    }
}

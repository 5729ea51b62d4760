use std::collections::VecDeque;

use egui::{CollapsingHeader, Color32, Sense, Stroke};

use crate::editor::panels::Panel;
use crate::engine::context::{AppCommand, EngineContext};
use crate::engine::input::MouseButton;

/// Application, window, renderer, input and camera settings.
#[derive(Default)]
pub struct ConfigurationPanel;

/// Bar graph of the last samples, scaled to the largest one.
fn history_graph(ui: &mut egui::Ui, label: &str, history: &VecDeque<f32>, color: Color32) {
    let latest = history.back().copied().unwrap_or(0.0);
    ui.label(format!("{} {:.1}", label, latest));

    let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 60.0), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, Color32::from_gray(24));

    let max = history.iter().copied().fold(1.0f32, f32::max);
    let count = history.len().max(1) as f32;
    let bar = rect.width() / count;
    for (i, value) in history.iter().enumerate() {
        let x = rect.left() + bar * (i as f32 + 0.5);
        let top = rect.bottom() - rect.height() * (value / max);
        painter.line_segment(
            [egui::pos2(x, rect.bottom()), egui::pos2(x, top)],
            Stroke::new(bar.max(1.0), color),
        );
    }
}

impl ConfigurationPanel {
    fn application(ui: &mut egui::Ui, ctx: &mut EngineContext) {
        egui::Grid::new("app_grid").num_columns(2).show(ui, |ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut ctx.app.name);
            ui.end_row();
            ui.label("Organization");
            ui.text_edit_singleline(&mut ctx.app.organization);
            ui.end_row();
        });

        let mut max_fps = ctx.stats.max_fps;
        if ui
            .add(egui::Slider::new(&mut max_fps, 0..=240).text("Max FPS (0 = uncapped)"))
            .changed()
        {
            ctx.request(AppCommand::SetMaxFps(max_fps));
        }

        history_graph(ui, "Framerate", &ctx.stats.fps_history, Color32::from_rgb(90, 200, 120));
        history_graph(ui, "Milliseconds", &ctx.stats.ms_history, Color32::from_rgb(200, 140, 80));
    }

    fn window(ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let mut settings = ctx.window.settings.clone();
        ui.add(egui::Slider::new(&mut settings.width, 640..=3840).text("Width"));
        ui.add(egui::Slider::new(&mut settings.height, 480..=2160).text("Height"));
        ui.horizontal(|ui| {
            ui.checkbox(&mut settings.fullscreen, "Fullscreen");
            ui.checkbox(&mut settings.resizable, "Resizable");
        });
        ui.horizontal(|ui| {
            ui.checkbox(&mut settings.borderless, "Borderless");
            ui.checkbox(&mut settings.full_desktop, "Full desktop");
        });
        if settings != ctx.window.settings {
            ctx.window.settings = settings;
            ctx.window.settings_dirty = true;
        }
        ui.label(format!(
            "Surface: {}x{} @ {:.2}",
            ctx.window.width, ctx.window.height, ctx.window.scale_factor
        ));
    }

    fn renderer(ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let render = &mut ctx.render;
        ui.horizontal(|ui| {
            ui.checkbox(&mut render.draw_meshes, "Meshes");
            ui.checkbox(&mut render.draw_wireframe, "Wireframe");
            ui.checkbox(&mut render.draw_normals, "Normals");
        });
        ui.horizontal(|ui| {
            ui.checkbox(&mut render.enable_depth, "Depth test");
            ui.checkbox(&mut render.enable_face_culling, "Face culling");
            ui.checkbox(&mut render.enable_lighting, "Lighting");
        });
        ui.horizontal(|ui| {
            ui.checkbox(&mut render.enable_color, "Color");
            ui.checkbox(&mut render.enable_textures, "Textures");
            ui.checkbox(&mut render.vsync, "VSync");
        });
        ui.add(egui::Slider::new(&mut render.normal_length, 0.01..=2.0).text("Normal length"));
        ui.horizontal(|ui| {
            ui.label("Clear color");
            ui.color_edit_button_rgba_unmultiplied(&mut render.clear_color);
        });
    }

    fn input(ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let input = &ctx.input;
        let position = input.mouse_position();
        let motion = input.mouse_motion();
        ui.label(format!("Mouse position: {:.0}, {:.0}", position.x, position.y));
        ui.label(format!("Mouse motion: {:.1}, {:.1}", motion.x, motion.y));
        ui.label(format!("Mouse wheel: {:.1}", input.wheel()));
        let held: Vec<String> = MouseButton::ALL
            .iter()
            .filter(|button| input.mouse_button(**button).is_pressed())
            .map(|button| format!("{:?}", button))
            .collect();
        ui.label(format!("Buttons: {}", held.join(", ")));
    }

    fn camera(ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let camera = &ctx.camera;
        ui.label(format!(
            "Position: {:.2}, {:.2}, {:.2}",
            camera.position.x, camera.position.y, camera.position.z
        ));
        ui.label(format!(
            "Reference: {:.2}, {:.2}, {:.2}",
            camera.reference.x, camera.reference.y, camera.reference.z
        ));
        ui.label(format!("Vertical FOV: {:.0}°", camera.fov_y_degrees));
    }

    fn file_system(ui: &mut egui::Ui, ctx: &mut EngineContext) {
        ui.label(format!("Write directory: {}", ctx.fs.save_directory().display()));
        for mount in ctx.fs.mounts() {
            let point = if mount.mount_point.is_empty() { "/" } else { mount.mount_point.as_str() };
            ui.label(format!("{} -> {}", point, mount.path.display()));
        }
    }
}

impl Panel for ConfigurationPanel {
    fn title(&self) -> &'static str {
        "Configuration"
    }

    fn open_by_default(&self) -> bool {
        true
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &mut EngineContext) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            CollapsingHeader::new("Application")
                .default_open(true)
                .show(ui, |ui| Self::application(ui, ctx));
            CollapsingHeader::new("Window").show(ui, |ui| Self::window(ui, ctx));
            CollapsingHeader::new("Renderer").show(ui, |ui| Self::renderer(ui, ctx));
            CollapsingHeader::new("Input").show(ui, |ui| Self::input(ui, ctx));
            CollapsingHeader::new("Camera").show(ui, |ui| Self::camera(ui, ctx));
            CollapsingHeader::new("File System").show(ui, |ui| Self::file_system(ui, ctx));
        });
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::clipboard::Clipboard;
use crate::editor::configuration::ConfigurationPanel;
use crate::editor::console::ConsolePanel;
use crate::editor::hierarchy::HierarchyPanel;
use crate::editor::inspector::InspectorPanel;
use crate::editor::panels::{AboutPanel, HardwarePanel, Panel, UiSettingsPanel};
use crate::editor::raw_input;
use crate::engine::context::{AppCommand, EngineContext, UiFrame};
use crate::engine::error::EngineError;
use crate::engine::module::{parse_section, to_section, Module, UpdateStatus};
use crate::scene::{Material, MeshComponent, MeshData};

/// What the main menu asked for this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    SaveConfig,
    LoadConfig,
    Quit,
    CreateEmpty,
    CreateCube,
    DeleteSelected,
    OpenLink(String),
}

/// Visibility of every editor window by title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub windows: BTreeMap<String, bool>,
    /// Targets of the Help menu entries. Entries without a link are hidden.
    pub documentation_url: Option<String>,
    pub report_bug_url: Option<String>,
}

struct PanelSlot {
    panel: Box<dyn Panel>,
    open: bool,
}

/// Immediate-mode editor: main menu plus toggleable windows. Produces a
/// tessellated `UiFrame` for the renderer every frame.
pub struct ModuleEditor {
    egui: egui::Context,
    panels: Vec<PanelSlot>,
    console: ConsolePanel,
    console_open: bool,
    documentation_url: Option<String>,
    report_bug_url: Option<String>,
    clipboard: Clipboard,
    cursor_icon: egui::CursorIcon,
    started: Instant,
    quit_requested: bool,
}

impl Default for ModuleEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleEditor {
    pub fn new() -> Self {
        let panels: Vec<Box<dyn Panel>> = vec![
            Box::new(ConfigurationPanel),
            Box::new(HardwarePanel),
            Box::new(HierarchyPanel::default()),
            Box::new(InspectorPanel),
            Box::new(UiSettingsPanel),
            Box::new(AboutPanel),
        ];
        let console = ConsolePanel::default();
        Self {
            egui: egui::Context::default(),
            panels: panels
                .into_iter()
                .map(|panel| PanelSlot {
                    open: panel.open_by_default(),
                    panel,
                })
                .collect(),
            console_open: console.open_by_default(),
            console,
            documentation_url: None,
            report_bug_url: None,
            clipboard: Clipboard::new(),
            cursor_icon: egui::CursorIcon::Default,
            started: Instant::now(),
            quit_requested: false,
        }
    }

    pub fn context(&self) -> &egui::Context {
        &self.egui
    }

    pub fn is_open(&self, title: &str) -> Option<bool> {
        if title == self.console.title() {
            return Some(self.console_open);
        }
        self.panels
            .iter()
            .find(|slot| slot.panel.title() == title)
            .map(|slot| slot.open)
    }

    /// Opens or closes a window. Returns false for an unknown title.
    pub fn set_open(&mut self, title: &str, open: bool) -> bool {
        if title == self.console.title() {
            self.console_open = open;
            return true;
        }
        match self.panels.iter_mut().find(|slot| slot.panel.title() == title) {
            Some(slot) => {
                slot.open = open;
                true
            }
            None => false,
        }
    }

    pub fn apply_action(&mut self, ctx: &mut EngineContext, action: MenuAction) {
        debug!("Menu action {:?}", action);
        match action {
            MenuAction::SaveConfig => ctx.request(AppCommand::SaveConfig),
            MenuAction::LoadConfig => ctx.request(AppCommand::LoadConfig),
            MenuAction::Quit => self.quit_requested = true,
            MenuAction::CreateEmpty => {
                if let Ok(id) = ctx.scene.create("GameObject", None) {
                    ctx.scene.select(Some(id));
                }
            }
            MenuAction::CreateCube => match ctx.scene.create("Cube", None) {
                Ok(id) => {
                    if let Ok(object) = ctx.scene.require_mut(id) {
                        let _ = object.add_component(MeshComponent::new(Arc::new(MeshData::cube(1.0))));
                        let _ = object.add_component(Material::default());
                    }
                    ctx.scene.select(Some(id));
                }
                Err(e) => warn!("Could not create cube: {}", e),
            },
            MenuAction::DeleteSelected => {
                if let Some(id) = ctx.scene.selected() {
                    ctx.scene.queue_removal(id);
                    ctx.scene.select(None);
                }
            }
            MenuAction::OpenLink(url) => ctx.request(AppCommand::OpenLink(url)),
        }
    }

    fn main_menu(&mut self, egui_ctx: &egui::Context) -> Option<MenuAction> {
        let mut action = None;
        egui::TopBottomPanel::top("main_menu").show(egui_ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    for (label, item) in [
                        ("Save configuration", MenuAction::SaveConfig),
                        ("Load configuration", MenuAction::LoadConfig),
                        ("Quit", MenuAction::Quit),
                    ] {
                        if ui.button(label).clicked() {
                            action = Some(item);
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    for slot in &mut self.panels {
                        ui.checkbox(&mut slot.open, slot.panel.title());
                    }
                    ui.checkbox(&mut self.console_open, self.console.title());
                });
                ui.menu_button("GameObject", |ui| {
                    for (label, item) in [
                        ("Create empty", MenuAction::CreateEmpty),
                        ("Create cube", MenuAction::CreateCube),
                        ("Delete selected", MenuAction::DeleteSelected),
                    ] {
                        if ui.button(label).clicked() {
                            action = Some(item);
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.set_open("About", true);
                        ui.close_menu();
                    }
                    for (label, url) in [
                        ("Documentation", &self.documentation_url),
                        ("Report a bug", &self.report_bug_url),
                    ] {
                        if let Some(url) = url {
                            if ui.button(label).clicked() {
                                action = Some(MenuAction::OpenLink(url.clone()));
                                ui.close_menu();
                            }
                        }
                    }
                });
            });
        });
        action
    }

    /// Applies what egui asked of the platform: links, copied text and the
    /// cursor shape.
    fn handle_platform_output(&mut self, ctx: &mut EngineContext, output: &egui::PlatformOutput) {
        if let Some(open_url) = &output.open_url {
            ctx.request(AppCommand::OpenLink(open_url.url.clone()));
        }
        if !output.copied_text.is_empty() {
            self.clipboard.set_text(&output.copied_text);
        }
        if output.cursor_icon != self.cursor_icon {
            self.cursor_icon = output.cursor_icon;
            if let Some(window) = &ctx.window.handle {
                match raw_input::winit_cursor(output.cursor_icon) {
                    Some(cursor) => {
                        window.set_cursor_visible(true);
                        window.set_cursor(cursor);
                    }
                    None => window.set_cursor_visible(false),
                }
            }
        }
    }

    fn draw(&mut self, egui_ctx: &egui::Context, ctx: &mut EngineContext) -> Option<MenuAction> {
        let action = self.main_menu(egui_ctx);

        for slot in self.panels.iter_mut().filter(|slot| slot.open) {
            let mut open = slot.open;
            let panel = &mut slot.panel;
            egui::Window::new(panel.title())
                .open(&mut open)
                .default_width(320.0)
                .show(egui_ctx, |ui| panel.show(ui, ctx));
            slot.open = open;
        }

        if self.console_open {
            let mut open = true;
            let console = &mut self.console;
            egui::Window::new(console.title())
                .open(&mut open)
                .default_width(480.0)
                .show(egui_ctx, |ui| console.show(ui, ctx));
            self.console_open = open;
        }
        action
    }
}

impl Module for ModuleEditor {
    fn name(&self) -> &str {
        "editor"
    }

    fn start(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Starting editor");
        self.started = Instant::now();
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, dt: f32) -> UpdateStatus {
        self.console.poll();

        let raw = raw_input::build(
            &ctx.input,
            &ctx.window,
            &mut self.clipboard,
            self.started.elapsed().as_secs_f64(),
            dt,
        );
        let egui_ctx = self.egui.clone();
        let mut action = None;
        let output = egui_ctx.run(raw, |egui_ctx| action = self.draw(egui_ctx, ctx));

        if let Some(action) = action {
            self.apply_action(ctx, action);
        }
        self.handle_platform_output(ctx, &output.platform_output);

        ctx.input.ui_wants_pointer = egui_ctx.wants_pointer_input() || egui_ctx.is_pointer_over_area();
        ctx.input.ui_wants_keyboard = egui_ctx.wants_keyboard_input();

        let primitives = egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        ctx.ui = Some(UiFrame {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        });

        if self.quit_requested {
            info!("Quit requested from the editor");
            return UpdateStatus::Stop;
        }
        UpdateStatus::Continue
    }

    fn clean_up(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Cleaning up editor");
        ctx.ui = None;
        Ok(())
    }

    fn load_config(&mut self, _ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        let config: EditorConfig = parse_section(self.name(), section)?;
        self.documentation_url = config.documentation_url;
        self.report_bug_url = config.report_bug_url;
        for (title, open) in &config.windows {
            if !self.set_open(title, *open) {
                debug!("Ignoring unknown editor window '{}'", title);
            }
        }
        Ok(())
    }

    fn save_config(&self, _ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        let mut windows: BTreeMap<String, bool> = self
            .panels
            .iter()
            .map(|slot| (slot.panel.title().to_string(), slot.open))
            .collect();
        windows.insert(self.console.title().to_string(), self.console_open);
        to_section(&EditorConfig {
            windows,
            documentation_url: self.documentation_url.clone(),
            report_bug_url: self.report_bug_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_a_frame_headlessly() {
        let mut ctx = EngineContext::new();
        let mut editor = ModuleEditor::new();
        editor.start(&mut ctx).unwrap();
        ctx.scene.create("Visible", None).unwrap();

        assert_eq!(editor.update(&mut ctx, 0.016), UpdateStatus::Continue);
        let frame = ctx.ui.take().unwrap();
        assert!(!frame.primitives.is_empty());
        assert!(!frame.textures_delta.set.is_empty());
        assert_eq!(frame.pixels_per_point, 1.0);
        assert!(!ctx.input.ui_wants_keyboard);
    }

    #[test]
    fn menu_quit_stops_the_frame() {
        let mut ctx = EngineContext::new();
        let mut editor = ModuleEditor::new();
        editor.apply_action(&mut ctx, MenuAction::Quit);
        assert_eq!(editor.update(&mut ctx, 0.016), UpdateStatus::Stop);
    }

    #[test]
    fn menu_actions_edit_scene_and_queue_commands() {
        let mut ctx = EngineContext::new();
        let mut editor = ModuleEditor::new();

        editor.apply_action(&mut ctx, MenuAction::CreateCube);
        let cube = ctx.scene.selected().unwrap();
        assert!(ctx.scene.get(cube).unwrap().mesh().is_some());

        editor.apply_action(&mut ctx, MenuAction::DeleteSelected);
        assert_eq!(ctx.scene.selected(), None);
        ctx.scene.apply_removals();
        assert!(!ctx.scene.contains(cube));

        editor.apply_action(&mut ctx, MenuAction::SaveConfig);
        editor.apply_action(&mut ctx, MenuAction::OpenLink("https://example.org/docs".to_string()));
        assert_eq!(
            ctx.take_commands(),
            vec![
                AppCommand::SaveConfig,
                AppCommand::OpenLink("https://example.org/docs".to_string())
            ]
        );
    }

    #[test]
    fn window_visibility_round_trips_through_config() {
        let mut ctx = EngineContext::new();
        let mut editor = ModuleEditor::new();
        assert_eq!(editor.is_open("Hardware"), Some(false));
        assert_eq!(editor.is_open("Console"), Some(true));

        editor
            .load_config(
                &mut ctx,
                &json!({ "windows": { "Hardware": true, "Console": false, "Demo": true } }),
            )
            .unwrap();
        assert_eq!(editor.is_open("Hardware"), Some(true));
        assert_eq!(editor.is_open("Console"), Some(false));
        assert_eq!(editor.is_open("Demo"), None);

        let saved = editor.save_config(&ctx).unwrap().unwrap();
        assert_eq!(saved["windows"]["Hardware"], json!(true));
        assert_eq!(saved["windows"]["Console"], json!(false));
        assert_eq!(saved["windows"]["Inspector"], json!(true));
        assert_eq!(saved["documentation_url"], Value::Null);
    }

    #[test]
    fn help_links_come_from_config() {
        let mut ctx = EngineContext::new();
        let mut editor = ModuleEditor::new();
        editor
            .load_config(&mut ctx, &json!({ "report_bug_url": "https://example.org/issues" }))
            .unwrap();
        assert_eq!(editor.documentation_url, None);

        let saved = editor.save_config(&ctx).unwrap().unwrap();
        assert_eq!(saved["report_bug_url"], json!("https://example.org/issues"));
    }

    #[test]
    fn platform_output_reaches_clipboard_and_commands() {
        let mut ctx = EngineContext::new();
        let mut editor = ModuleEditor::new();
        editor.clipboard = Clipboard::detached();

        let output = egui::PlatformOutput {
            copied_text: "Main Camera".to_string(),
            open_url: Some(egui::output::OpenUrl::new_tab("https://example.org")),
            cursor_icon: egui::CursorIcon::Text,
            ..Default::default()
        };
        editor.handle_platform_output(&mut ctx, &output);

        assert_eq!(editor.clipboard.get_text().as_deref(), Some("Main Camera"));
        assert_eq!(editor.cursor_icon, egui::CursorIcon::Text);
        assert_eq!(
            ctx.take_commands(),
            vec![AppCommand::OpenLink("https://example.org".to_string())]
        );

        // Nothing copied this frame keeps the clipboard as it was.
        editor.handle_platform_output(&mut ctx, &egui::PlatformOutput::default());
        assert_eq!(editor.clipboard.get_text().as_deref(), Some("Main Camera"));
    }
}

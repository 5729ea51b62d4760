use crossbeam_channel::Receiver;

use crate::editor::panels::Panel;
use crate::engine::context::EngineContext;
use crate::engine::log_capture::{self, ConsoleBuffer, LogLine};

/// Shows the captured log, newest at the bottom.
pub struct ConsolePanel {
    receiver: Option<Receiver<LogLine>>,
    buffer: ConsoleBuffer,
    min_level: log::Level,
    filter: String,
}

impl Default for ConsolePanel {
    fn default() -> Self {
        Self::new(log_capture::subscribe())
    }
}

impl ConsolePanel {
    pub fn new(receiver: Option<Receiver<LogLine>>) -> Self {
        Self {
            receiver,
            buffer: ConsoleBuffer::default(),
            min_level: log::Level::Info,
            filter: String::new(),
        }
    }

    /// Pulls new lines out of the log channel. Runs every frame, visible or
    /// not, so the channel never backs up.
    pub fn poll(&mut self) -> usize {
        match &self.receiver {
            Some(receiver) => self.buffer.drain(receiver),
            None => 0,
        }
    }

    pub fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }
}

fn level_color(level: log::Level) -> egui::Color32 {
    match level {
        log::Level::Error => egui::Color32::from_rgb(230, 80, 80),
        log::Level::Warn => egui::Color32::from_rgb(230, 180, 60),
        log::Level::Info => egui::Color32::from_rgb(200, 200, 200),
        log::Level::Debug => egui::Color32::from_rgb(120, 170, 230),
        log::Level::Trace => egui::Color32::GRAY,
    }
}

impl Panel for ConsolePanel {
    fn title(&self) -> &'static str {
        "Console"
    }

    fn open_by_default(&self) -> bool {
        true
    }

    fn show(&mut self, ui: &mut egui::Ui, _ctx: &mut EngineContext) {
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_source("console_level")
                .selected_text(self.min_level.as_str())
                .show_ui(ui, |ui| {
                    for level in [
                        log::Level::Error,
                        log::Level::Warn,
                        log::Level::Info,
                        log::Level::Debug,
                        log::Level::Trace,
                    ] {
                        ui.selectable_value(&mut self.min_level, level, level.as_str());
                    }
                });
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.filter);
            if ui.button("Clear").clicked() {
                self.buffer.clear();
            }
        });
        ui.separator();

        let filter = self.filter.to_lowercase();
        let min_level = self.min_level;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in self.buffer.lines().filter(|line| {
                    line.level <= min_level
                        && (filter.is_empty() || line.message.to_lowercase().contains(&filter))
                }) {
                    ui.label(
                        egui::RichText::new(format!("[{}] {}", line.level, line.message))
                            .color(level_color(line.level))
                            .monospace(),
                    );
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn poll_drains_the_channel() {
        let (sender, receiver) = unbounded();
        let mut console = ConsolePanel::new(Some(receiver));
        for i in 0..3 {
            sender
                .send(LogLine {
                    level: log::Level::Warn,
                    target: "test".to_string(),
                    message: format!("line {}", i),
                })
                .unwrap();
        }
        assert_eq!(console.poll(), 3);
        assert_eq!(console.poll(), 0);
        assert_eq!(console.buffer().len(), 3);
    }

    #[test]
    fn works_without_a_logger() {
        let mut console = ConsolePanel::new(None);
        assert_eq!(console.poll(), 0);
        assert!(console.buffer().is_empty());
    }
}

use std::collections::HashSet;

use log::warn;

use crate::editor::panels::Panel;
use crate::engine::context::EngineContext;
use crate::scene::{GameObjectId, Scene};

const INDENT: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HierarchyAction {
    Select(GameObjectId),
    CreateChild(GameObjectId),
    AdoptSelected(GameObjectId),
    MoveToRoot(GameObjectId),
    Delete(GameObjectId),
}

/// The game object tree. Click selects; right click opens the edit menu.
#[derive(Default)]
pub struct HierarchyPanel {
    collapsed: HashSet<GameObjectId>,
}

impl HierarchyPanel {
    /// Rows to draw: every object whose ancestors are all expanded.
    fn visible_rows(&self, scene: &Scene) -> Vec<(GameObjectId, usize)> {
        let mut rows = Vec::new();
        let mut hidden_below: Option<usize> = None;
        for (id, depth) in scene.iter_depth_first() {
            if let Some(limit) = hidden_below {
                if depth > limit {
                    continue;
                }
                hidden_below = None;
            }
            rows.push((id, depth));
            if self.collapsed.contains(&id) {
                hidden_below = Some(depth);
            }
        }
        rows
    }

    fn apply(&mut self, scene: &mut Scene, action: HierarchyAction) {
        let result = match action {
            HierarchyAction::Select(id) => {
                scene.select(Some(id));
                Ok(())
            }
            HierarchyAction::CreateChild(parent) => scene.create("GameObject", Some(parent)).map(|child| {
                self.collapsed.remove(&parent);
                scene.select(Some(child));
            }),
            HierarchyAction::AdoptSelected(parent) => match scene.selected() {
                Some(child) => scene.reparent(child, Some(parent)),
                None => Ok(()),
            },
            HierarchyAction::MoveToRoot(id) => scene.reparent(id, None),
            HierarchyAction::Delete(id) => {
                scene.queue_removal(id);
                if scene.selected() == Some(id) {
                    scene.select(None);
                }
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("Hierarchy edit failed: {}", e);
        }
    }
}

impl Panel for HierarchyPanel {
    fn title(&self) -> &'static str {
        "Hierarchy"
    }

    fn open_by_default(&self) -> bool {
        true
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let selected = ctx.scene.selected();
        let mut action = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (id, depth) in self.visible_rows(&ctx.scene) {
                let Some(object) = ctx.scene.get(id) else {
                    continue;
                };
                let has_children = !object.children().is_empty();
                let collapsed = self.collapsed.contains(&id);

                ui.horizontal(|ui| {
                    ui.add_space(depth as f32 * INDENT);
                    if has_children {
                        let arrow = if collapsed { "▶" } else { "▼" };
                        if ui.small_button(arrow).clicked() {
                            if collapsed {
                                self.collapsed.remove(&id);
                            } else {
                                self.collapsed.insert(id);
                            }
                        }
                    } else {
                        ui.add_space(INDENT);
                    }

                    let mut text = egui::RichText::new(object.name());
                    if !object.is_active() {
                        text = text.weak();
                    }
                    let response = ui.selectable_label(selected == Some(id), text);
                    if response.clicked() {
                        action = Some(HierarchyAction::Select(id));
                    }
                    response.context_menu(|ui| {
                        if ui.button("Create child").clicked() {
                            action = Some(HierarchyAction::CreateChild(id));
                            ui.close_menu();
                        }
                        let can_adopt = selected.is_some_and(|s| s != id);
                        if ui
                            .add_enabled(can_adopt, egui::Button::new("Parent selection here"))
                            .clicked()
                        {
                            action = Some(HierarchyAction::AdoptSelected(id));
                            ui.close_menu();
                        }
                        if ui
                            .add_enabled(object.parent().is_some(), egui::Button::new("Move to root"))
                            .clicked()
                        {
                            action = Some(HierarchyAction::MoveToRoot(id));
                            ui.close_menu();
                        }
                        ui.separator();
                        if ui.button("Delete").clicked() {
                            action = Some(HierarchyAction::Delete(id));
                            ui.close_menu();
                        }
                    });
                });
            }

            if ctx.scene.is_empty() {
                ui.weak("Empty scene");
            }
        });

        if let Some(action) = action {
            self.apply(&mut ctx.scene, action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_nodes_hide_their_subtree() {
        let mut scene = Scene::new();
        let a = scene.create("a", None).unwrap();
        let b = scene.create("b", Some(a)).unwrap();
        let _c = scene.create("c", Some(b)).unwrap();
        let d = scene.create("d", None).unwrap();

        let mut panel = HierarchyPanel::default();
        assert_eq!(panel.visible_rows(&scene).len(), 4);

        panel.collapsed.insert(a);
        assert_eq!(panel.visible_rows(&scene), vec![(a, 0), (d, 0)]);
    }

    #[test]
    fn actions_edit_the_scene() {
        let mut scene = Scene::new();
        let a = scene.create("a", None).unwrap();
        let b = scene.create("b", None).unwrap();
        let mut panel = HierarchyPanel::default();

        panel.apply(&mut scene, HierarchyAction::Select(b));
        panel.apply(&mut scene, HierarchyAction::AdoptSelected(a));
        assert_eq!(scene.get(b).unwrap().parent(), Some(a));

        // A parent cannot move under its own child.
        panel.apply(&mut scene, HierarchyAction::Select(a));
        panel.apply(&mut scene, HierarchyAction::AdoptSelected(b));
        assert_eq!(scene.get(a).unwrap().parent(), None);

        panel.apply(&mut scene, HierarchyAction::CreateChild(b));
        let child = scene.selected().unwrap();
        assert_eq!(scene.get(child).unwrap().parent(), Some(b));

        panel.apply(&mut scene, HierarchyAction::Delete(child));
        assert_eq!(scene.selected(), None);
        scene.apply_removals();
        assert!(!scene.contains(child));
    }
}

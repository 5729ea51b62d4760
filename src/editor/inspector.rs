use std::sync::Arc;

use egui::{CollapsingHeader, DragValue};
use glam::Vec3;
use log::warn;

use crate::editor::panels::Panel;
use crate::engine::context::EngineContext;
use crate::scene::{ComponentData, ComponentKind, GameObject, Material, MeshComponent, MeshData, TextureData};

/// Attribute editor for the selected game object.
#[derive(Default)]
pub struct InspectorPanel;

enum InspectorAction {
    Remove(ComponentKind),
    Add(ComponentKind),
}

/// Three drag fields in a row. Returns the edited value when it changed.
fn vec3_row(ui: &mut egui::Ui, label: &str, value: Vec3, speed: f32) -> Option<Vec3> {
    let mut edited = value;
    let changed = ui
        .horizontal(|ui| {
            ui.label(label);
            let x = ui.add(DragValue::new(&mut edited.x).speed(speed).prefix("x: ")).changed();
            let y = ui.add(DragValue::new(&mut edited.y).speed(speed).prefix("y: ")).changed();
            let z = ui.add(DragValue::new(&mut edited.z).speed(speed).prefix("z: ")).changed();
            x || y || z
        })
        .inner;
    changed.then_some(edited)
}

fn transform_ui(ui: &mut egui::Ui, object: &mut GameObject) {
    let transform = object.transform_mut();
    if let Some(position) = vec3_row(ui, "Position", transform.position(), 0.05) {
        transform.set_position(position);
    }
    if let Some(degrees) = vec3_row(ui, "Rotation", transform.rotation_degrees(), 0.5) {
        transform.set_rotation_degrees(degrees);
    }
    if let Some(scale) = vec3_row(ui, "Scale", transform.scale(), 0.01) {
        transform.set_scale(scale);
    }
    if ui.button("Reset").clicked() {
        transform.reset();
    }
}

fn mesh_ui(ui: &mut egui::Ui, mesh: &MeshComponent) {
    let data = mesh.mesh();
    ui.label(format!("Mesh: {}", data.name()));
    ui.label(format!("Vertices: {}", data.vertices().len()));
    ui.label(format!("Triangles: {}", data.triangle_count()));
    let bounds = mesh.world_aabb();
    let size = bounds.size();
    ui.label(format!("World size: {:.2} x {:.2} x {:.2}", size.x, size.y, size.z));
}

fn material_ui(ui: &mut egui::Ui, material: &mut Material) {
    ui.horizontal(|ui| {
        ui.label("Color");
        ui.color_edit_button_rgba_unmultiplied(&mut material.color);
    });
    match &material.texture {
        Some(texture) => {
            ui.label(format!(
                "Texture: {} ({}x{})",
                texture.name(),
                texture.width(),
                texture.height()
            ));
            if ui.button("Remove texture").clicked() {
                material.set_texture(None);
            }
        }
        None => {
            ui.horizontal(|ui| {
                ui.weak("No texture");
                if ui.button("Checkers").clicked() {
                    material.set_texture(Some(Arc::new(TextureData::checkers(64, 8))));
                }
            });
        }
    }
}

impl Panel for InspectorPanel {
    fn title(&self) -> &'static str {
        "Inspector"
    }

    fn open_by_default(&self) -> bool {
        true
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &mut EngineContext) {
        let Some(id) = ctx.scene.selected() else {
            ui.weak("Select a game object in the hierarchy");
            return;
        };
        let Some(object) = ctx.scene.get_mut(id) else {
            return;
        };

        ui.horizontal(|ui| {
            let mut active = object.is_active();
            if ui.checkbox(&mut active, "").changed() {
                object.set_active(active);
            }
            let mut name = object.name().to_string();
            if ui.text_edit_singleline(&mut name).changed() {
                object.set_name(name);
            }
        });
        ui.weak(format!("id {}", id));
        ui.separator();

        let mut action = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            CollapsingHeader::new(ComponentKind::Transform.label())
                .default_open(true)
                .show(ui, |ui| transform_ui(ui, object));

            for component in object.components_mut() {
                let kind = component.kind();
                CollapsingHeader::new(kind.label())
                    .id_source(("component", kind.label()))
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let mut active = component.is_active();
                            if ui.checkbox(&mut active, "Active").changed() {
                                component.set_active(active);
                            }
                            if ui.small_button("Remove").clicked() {
                                action = Some(InspectorAction::Remove(kind));
                            }
                        });
                        match component.data_mut() {
                            ComponentData::Mesh(mesh) => mesh_ui(ui, mesh),
                            ComponentData::Material(material) => material_ui(ui, material),
                        }
                    });
            }

            ui.separator();
            ui.menu_button("Add component", |ui| {
                if ui.button("Mesh (cube)").clicked() {
                    action = Some(InspectorAction::Add(ComponentKind::Mesh));
                    ui.close_menu();
                }
                if ui.button("Material").clicked() {
                    action = Some(InspectorAction::Add(ComponentKind::Material));
                    ui.close_menu();
                }
            });
        });

        let result = match action {
            Some(InspectorAction::Remove(kind)) => object.remove_component(kind).map(|_| ()),
            Some(InspectorAction::Add(ComponentKind::Mesh)) => object
                .add_component(MeshComponent::new(Arc::new(MeshData::cube(1.0))))
                .map(|_| ()),
            Some(InspectorAction::Add(ComponentKind::Material)) => {
                object.add_component(Material::default()).map(|_| ())
            }
            Some(InspectorAction::Add(ComponentKind::Transform)) | None => Ok(()),
        };
        if let Err(e) = result {
            warn!("Inspector edit on '{}' failed: {}", object.name(), e);
        }
    }
}

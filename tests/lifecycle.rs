use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use newgine::engine::input::InputEvent;
use newgine::engine::module::parse_section;
use newgine::game::build_modules;
use newgine::{Application, EngineContext, EngineError, Module, UpdateStatus};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProbeConfig {
    speed: f32,
}

/// Records every hook it receives.
struct Probe {
    name: &'static str,
    journal: Journal,
    config: ProbeConfig,
    stop_after: Option<u32>,
    frames: u32,
}

impl Probe {
    fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: Arc::clone(journal),
            config: ProbeConfig::default(),
            stop_after: None,
            frames: 0,
        }
    }

    fn log(&self, hook: &str) {
        self.journal.lock().unwrap().push(format!("{}:{}", self.name, hook));
    }
}

impl Module for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        self.log("init");
        Ok(())
    }

    fn start(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        self.log("start");
        Ok(())
    }

    fn pre_update(&mut self, _ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        self.log("pre");
        UpdateStatus::Continue
    }

    fn update(&mut self, _ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        self.log("update");
        self.frames += 1;
        match self.stop_after {
            Some(limit) if self.frames >= limit => UpdateStatus::Stop,
            _ => UpdateStatus::Continue,
        }
    }

    fn post_update(&mut self, _ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        self.log("post");
        UpdateStatus::Continue
    }

    fn clean_up(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        self.log("cleanup");
        Ok(())
    }

    fn load_config(&mut self, _ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        self.config = parse_section(self.name, section)?;
        self.log("load");
        Ok(())
    }

    fn save_config(&self, _ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        Ok(Some(serde_json::to_value(&self.config)?))
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn hooks_run_in_registration_order_and_clean_up_in_reverse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let doc = json!({
        "App": { "name": "Probe", "max_fps": 0, "b": { "speed": 2.5 } },
        "Other": { "kept": true }
    });
    fs::write(&path, doc.to_string()).unwrap();

    let journal = Journal::default();
    let mut app = Application::new(&path);
    app.add_module(Box::new(Probe::new("a", &journal)));
    let mut b = Probe::new("b", &journal);
    b.stop_after = Some(2);
    app.add_module(Box::new(b));

    app.init().unwrap();
    assert_eq!(app.context().app.name, "Probe");
    assert_eq!(app.context().stats.max_fps, 0);
    assert_eq!(app.update(), UpdateStatus::Continue);
    assert_eq!(app.update(), UpdateStatus::Stop);
    app.cleanup().unwrap();

    let calls = journal.lock().unwrap().clone();
    assert_eq!(
        calls,
        [
            "b:load", "a:init", "b:init", "a:start", "b:start", "a:pre", "b:pre", "a:update",
            "b:update", "a:post", "b:post", "a:pre", "b:pre", "a:update", "b:update", "b:cleanup",
            "a:cleanup",
        ]
    );

    let saved = read_json(&path);
    assert_eq!(saved["App"]["b"]["speed"], 2.5);
    assert_eq!(saved["App"]["a"]["speed"], 0.0);
    assert_eq!(saved["Other"]["kept"], true);
}

#[test]
fn disabled_module_skips_updates_but_not_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let mut app = Application::new(dir.path().join("config.json"));
    app.add_module(Box::new(Probe::new("a", &journal)));
    app.set_max_fps(0);

    app.init().unwrap();
    assert!(app.set_module_enabled("a", false));
    assert!(!app.set_module_enabled("missing", false));
    assert_eq!(app.is_module_enabled("a"), Some(false));
    app.update();
    app.cleanup().unwrap();

    let calls = journal.lock().unwrap().clone();
    assert_eq!(calls, ["a:init", "a:start", "a:cleanup"]);
    assert!(dir.path().join("config.json").exists());
}

#[test]
fn disabled_renderer_does_not_let_frame_output_pile_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let doc = json!({
        "App": {
            "max_fps": 0,
            "file_system": { "write_dir": dir.path().join("Library"), "mounts": [] }
        }
    });
    fs::write(&path, doc.to_string()).unwrap();

    let mut app = Application::new(&path);
    for module in build_modules() {
        app.add_module(module);
    }
    app.init().unwrap();
    assert!(app.set_module_enabled("renderer", false));

    app.update();
    let per_frame = app.context().debug.lines.len();
    assert!(per_frame > 0);
    for _ in 0..4 {
        app.update();
        assert_eq!(app.context().debug.lines.len(), per_frame);
    }
    app.cleanup().unwrap();
}

#[test]
fn editor_runs_headless_until_quit() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    fs::create_dir_all(&assets).unwrap();
    let path = dir.path().join("config.json");
    let doc = json!({
        "App": {
            "name": "Headless",
            "max_fps": 0,
            "window": { "width": 320, "height": 200 },
            "file_system": {
                "write_dir": dir.path().join("Library"),
                "mounts": [{ "path": assets, "mount_point": "Assets" }]
            },
            "editor": { "windows": { "About": true } }
        }
    });
    fs::write(&path, doc.to_string()).unwrap();

    let mut app = Application::new(&path);
    for module in build_modules() {
        app.add_module(module);
    }
    app.init().unwrap();
    assert_eq!((app.context().window.width, app.context().window.height), (320, 200));
    assert!(app.context().fs.exists("Assets"));

    for _ in 0..3 {
        assert_eq!(app.update(), UpdateStatus::Continue);
    }
    let id = app.context_mut().scene.create("Probe", None).unwrap();
    app.update();
    assert!(app.context().scene.contains(id));

    app.context_mut().input.push_event(InputEvent::Quit);
    assert_eq!(app.update(), UpdateStatus::Stop);
    app.cleanup().unwrap();
    assert!(app.context().scene.is_empty());

    let saved = read_json(&path);
    assert_eq!(saved["App"]["name"], "Headless");
    assert_eq!(saved["App"]["window"]["width"], 320);
    assert_eq!(saved["App"]["editor"]["windows"]["About"], true);
    assert!(saved["App"]["renderer"].is_object());
    assert!(saved["App"]["camera"].is_object());
}

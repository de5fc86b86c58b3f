//! File directives: imports, templates, conditional includes and the
//! safety checks around them.

use pretty_assertions::assert_eq;
use serde_json::json;
use smartyaml::{ErrorKind, LoadOptions, NativeRuntime, TEMPLATE_PATH_ENV, load};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn to_json(value: &smartyaml::Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

#[test]
fn test_import_text_and_yaml() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "prompt.txt", "You are helpful.\n");
    write(dir.path(), "db.yaml", "host: localhost\nport: 5432\n");
    let main = write(
        dir.path(),
        "main.yaml",
        "prompt: !import prompt.txt\ndb: !import_yaml(db.yaml)\n  host: db.prod\n",
    );

    assert_eq!(
        to_json(&load(&main, &LoadOptions::new()).unwrap()),
        json!({
            "prompt": "You are helpful.\n",
            "db": {"host": "db.prod", "port": 5432},
        })
    );
}

#[test]
fn test_cycle_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.yaml", "b: !import_yaml b.yaml\n");
    write(dir.path(), "b.yaml", "a: !import_yaml a.yaml\n");

    let err = load(dir.path().join("a.yaml"), &LoadOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecursionLimit);
    assert!(err.to_string().contains("Circular import detected"));
}

#[test]
fn test_depth_limit() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..5 {
        write(
            dir.path(),
            &format!("level{i}.yaml"),
            &format!("next: !import_yaml level{}.yaml\n", i + 1),
        );
    }
    write(dir.path(), "level5.yaml", "done: true\n");
    let main = dir.path().join("level0.yaml");

    let err = load(&main, &LoadOptions::new().with_max_recursion_depth(3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecursionLimit);
    assert!(err.to_string().contains("Maximum recursion depth (3) exceeded"));

    let value = load(&main, &LoadOptions::new()).unwrap();
    let mut node = &value;
    for _ in 0..5 {
        node = node.get("next").unwrap();
    }
    assert_eq!(node.get("done"), Some(&smartyaml::Value::Bool(true)));
}

#[test]
fn test_error_context_reports_chain() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.yaml", "outer: !import_yaml sub/outer.yaml\n");
    write(dir.path(), "sub/outer.yaml", "name: x\ninner: !import missing.txt\n");

    let err = load(dir.path().join("main.yaml"), &LoadOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    let context = err.context().unwrap();
    assert_eq!(context.directive, "import");
    assert_eq!(context.location.as_ref().map(|l| l.line), Some(2));
    assert_eq!(context.import_depth, 1);

    let message = err.to_string();
    assert!(message.contains("line 2:"), "{message}");
    assert!(message.contains("outer.yaml"), "{message}");
    assert!(message.contains("filename=missing.txt"), "{message}");
    assert!(message.contains("import_chain="), "{message}");
    assert!(message.contains("max_recursion_depth=10"), "{message}");
}

#[test]
fn test_template_resolution() {
    let templates = tempfile::tempdir().unwrap();
    write(
        templates.path(),
        "agent.yaml",
        "__vars:\n  tone: friendly\nmodel: small\nprompt: !expand 'Be {{tone}}'\nrules: [no-spam]\n",
    );
    let work = tempfile::tempdir().unwrap();
    let main = write(
        work.path(),
        "main.yaml",
        "agent: !template(agent)\n  model: large\n  rules: !extend [cite-sources]\n",
    );

    let options = LoadOptions::new().with_template_path(templates.path());
    assert_eq!(
        to_json(&load(&main, &options).unwrap()),
        json!({
            "agent": {
                "model": "large",
                "prompt": "Be friendly",
                "rules": ["no-spam", "cite-sources"],
            }
        })
    );
}

#[test]
fn test_template_path_from_environment() {
    let templates = tempfile::tempdir().unwrap();
    write(templates.path(), "base.yaml", "kind: base\n");
    let work = tempfile::tempdir().unwrap();
    let main = write(work.path(), "main.yaml", "b: !template base\n");

    let runtime = NativeRuntime::new().with_env(TEMPLATE_PATH_ENV, templates.path().to_string_lossy());
    let options = LoadOptions::new().with_runtime(Arc::new(runtime));
    assert_eq!(
        to_json(&load(&main, &options).unwrap()),
        json!({"b": {"kind": "base"}})
    );
}

#[test]
fn test_template_traversal_rejected() {
    let templates = tempfile::tempdir().unwrap();
    write(templates.path(), "base.yaml", "kind: base\n");
    let work = tempfile::tempdir().unwrap();
    write(work.path(), "secret.yaml", "password: hunter2\n");
    let main = write(work.path(), "main.yaml", "b: !template ../secret\n");

    let options = LoadOptions::new().with_template_path(templates.path());
    let err = load(&main, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);
    assert!(!err.to_string().contains("hunter2"));
}

#[test]
fn test_template_without_root() {
    let work = tempfile::tempdir().unwrap();
    let main = write(work.path(), "main.yaml", "b: !template base\n");
    let runtime = NativeRuntime::new().without_env(TEMPLATE_PATH_ENV);
    let options = LoadOptions::new().with_runtime(Arc::new(runtime));

    let err = load(&main, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TemplatePath);
}

#[test]
fn test_conditional_includes() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "debug.yaml", "level: trace\n");
    let main = write(
        dir.path(),
        "main.yaml",
        "debug: !include_yaml_if [SY_FEATURE, debug.yaml]\nabsent: !include_if [SY_OFF, does-not-exist.txt]\n",
    );

    let runtime = NativeRuntime::new()
        .with_env("SY_FEATURE", "enabled")
        .with_env("SY_OFF", "0");
    let options = LoadOptions::new().with_runtime(Arc::new(runtime));
    assert_eq!(
        to_json(&load(&main, &options).unwrap()),
        json!({"debug": {"level": "trace"}, "absent": null})
    );
}

#[test]
fn test_shared_anchors_from_template() {
    let templates = tempfile::tempdir().unwrap();
    write(
        templates.path(),
        "defaults.yaml",
        "limits: &limits\n  cpu: 2\n  memory: 4Gi\nname: defaults\n",
    );
    let work = tempfile::tempdir().unwrap();
    let main = write(
        work.path(),
        "main.yaml",
        "base: !template defaults\nworker:\n  <<: *limits\n  cpu: 8\n",
    );

    let options = LoadOptions::new().with_template_path(templates.path());
    let value = to_json(&load(&main, &options).unwrap());
    assert_eq!(value["worker"], json!({"cpu": 8, "memory": "4Gi"}));
    assert_eq!(value["base"]["limits"], json!({"cpu": 2, "memory": "4Gi"}));
}

#[test]
fn test_shared_anchor_names_in_plain_text_stay_text() {
    let templates = tempfile::tempdir().unwrap();
    write(templates.path(), "base.yaml", "factor: &factor 3\n");
    let work = tempfile::tempdir().unwrap();
    let main = write(
        work.path(),
        "main.yaml",
        "b: !template base\nnote: multiply by *factor\nn: *factor\n",
    );

    let options = LoadOptions::new().with_template_path(templates.path());
    let value = to_json(&load(&main, &options).unwrap());
    assert_eq!(value["note"], json!("multiply by *factor"));
    assert_eq!(value["n"], json!(3));
}

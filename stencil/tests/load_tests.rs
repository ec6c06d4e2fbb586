//! Loading: naming, extension filtering, reload policy and load failures.

use std::fs;
use std::path::Path;

use rstest::rstest;
use serde_json::json;
use stencil::{Engine, RenderError};
use stencil_source::SourceError;
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write");
}

// ---------------------------------------------------------------------------
// 1. Naming and filtering
// ---------------------------------------------------------------------------

#[test]
fn nested_file_is_named_by_relative_slash_path() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "a/b/c.html", "deep");

    let engine = Engine::new(dir.path(), ".html");
    engine.load().expect("load");
    assert_eq!(engine.template_names(), vec!["a/b/c"]);
    assert_eq!(engine.render_to_string("a/b/c", &(), None).expect("render"), "deep");
}

#[rstest]
#[case(".html", &["index", "nested/page"])]
#[case(".tmpl", &["mail"])]
#[case(".txt", &["readme"])]
#[case(".md", &[])]
fn only_matching_extension_is_compiled(#[case] ext: &str, #[case] expected: &[&str]) {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "index.html", "i");
    write(dir.path(), "nested/page.html", "p");
    write(dir.path(), "mail.tmpl", "m");
    write(dir.path(), "readme.txt", "r");
    write(dir.path(), "index.html.bak", "{% broken");
    write(dir.path(), "style.htm", "s");

    let engine = Engine::new(dir.path(), ext);
    engine.load().expect("load");
    assert_eq!(engine.template_names(), expected);
}

#[test]
fn empty_root_loads_empty_set() {
    let dir = TempDir::new().expect("tempdir");
    let engine = Engine::new(dir.path(), ".html");
    engine.load().expect("load");
    assert!(engine.is_loaded());
    assert!(engine.template_names().is_empty());
}

#[test]
fn templates_can_extend_each_other() {
    let dir = TempDir::new().expect("tempdir");
    // "base" sorts after "a-page", so it is read second.
    write(dir.path(), "a-page.html", "{% extends \"base\" %}{% block main %}child{% endblock %}");
    write(dir.path(), "base.html", "[{% block main %}parent{% endblock %}]");

    let engine = Engine::new(dir.path(), ".html");
    let out = engine.render_to_string("a-page", &(), None).expect("render");
    assert_eq!(out, "[child]");
}

// ---------------------------------------------------------------------------
// 2. Load / reload policy
// ---------------------------------------------------------------------------

#[test]
fn render_loads_implicitly() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "hello.html", "hi {{ who }}");

    let engine = Engine::new(dir.path(), ".html");
    assert!(!engine.is_loaded());
    let out = engine.render_to_string("hello", &json!({ "who": "there" }), None).expect("render");
    assert_eq!(out, "hi there");
    assert!(engine.is_loaded());
}

#[test]
fn second_load_is_a_no_op() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "page.html", "before");

    let engine = Engine::new(dir.path(), ".html");
    engine.load().expect("first load");
    let names = engine.template_names();

    write(dir.path(), "page.html", "after");
    write(dir.path(), "extra.html", "new");
    engine.load().expect("second load");

    assert_eq!(engine.template_names(), names);
    assert_eq!(engine.render_to_string("page", &(), None).expect("render"), "before");
}

#[test]
fn reload_picks_up_edits() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "reload.html", "before reload\n");

    let engine = Engine::new(dir.path(), ".html");
    engine.set_reload(true);
    let first = engine.render_to_string("reload", &(), None).expect("render");
    assert_eq!(first.trim(), "before reload");

    write(dir.path(), "reload.html", "after reload\n");
    let second = engine.render_to_string("reload", &(), None).expect("render");
    assert_eq!(second.trim(), "after reload");
}

#[test]
fn reload_registers_late_functions() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "admin.html", "{{ is_admin(user=user) }}");

    let engine = Engine::new(dir.path(), ".html");
    engine.set_reload(true);
    engine.add_func(
        "is_admin",
        |args: &std::collections::HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
            Ok(tera::Value::Bool(args.get("user") == Some(&json!("admin"))))
        },
    );
    let out = engine.render_to_string("admin", &json!({ "user": "admin" }), None).expect("render");
    assert_eq!(out, "true");
}

#[test]
fn without_reload_edits_are_ignored() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "reload.html", "before reload");

    let engine = Engine::new(dir.path(), ".html");
    engine.render_to_string("reload", &(), None).expect("render");
    write(dir.path(), "reload.html", "after reload");
    let out = engine.render_to_string("reload", &(), None).expect("render");
    assert_eq!(out, "before reload");
}

// ---------------------------------------------------------------------------
// 3. Failures
// ---------------------------------------------------------------------------

#[test]
fn missing_root_is_a_source_error() {
    let dir = TempDir::new().expect("tempdir");
    let engine = Engine::new(dir.path().join("missing"), ".html");

    let err = engine.load().unwrap_err();
    assert!(
        matches!(err, RenderError::Source(SourceError::NotFound { .. })),
        "got: {err}"
    );
    let err = engine.render_to_string("index", &(), None).unwrap_err();
    assert!(matches!(err, RenderError::Source(_)), "render must surface the load error, got: {err}");
}

#[test]
fn syntax_error_names_the_file() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "good.html", "ok");
    write(dir.path(), "broken.html", "{% if %}");

    let engine = Engine::new(dir.path(), ".html");
    let err = engine.load().unwrap_err();
    assert!(matches!(err, RenderError::Compile { .. }), "got: {err}");
    assert!(err.to_string().contains("broken"), "got: {err}");
    assert!(!engine.is_loaded());
    assert!(engine.template_names().is_empty(), "no partial set may be exposed");
}

#[test]
fn extension_without_dot_fails_load() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "index.html", "i");

    let engine = Engine::new(dir.path(), "html");
    let err = engine.load().unwrap_err();
    assert!(matches!(&err, RenderError::InvalidExtension(e) if e == "html"), "got: {err}");
    assert!(!engine.is_loaded());
}

#[test]
fn invalid_utf8_is_an_encoding_error() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("bin.html"), [0xff, 0xfe, 0x00]).expect("write");

    let engine = Engine::new(dir.path(), ".html");
    let err = engine.load().unwrap_err();
    assert!(matches!(err, RenderError::Encoding { .. }), "got: {err}");
}

#[test]
fn failed_first_load_is_retried() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "page.html", "{% if %}");

    let engine = Engine::new(dir.path(), ".html");
    engine.render_to_string("page", &(), None).unwrap_err();

    write(dir.path(), "page.html", "fixed");
    let out = engine.render_to_string("page", &(), None).expect("render after fix");
    assert_eq!(out, "fixed");
}

#[test]
fn failed_reload_keeps_previous_set() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "page.html", "v1");

    let engine = Engine::new(dir.path(), ".html");
    engine.set_reload(true);
    assert_eq!(engine.render_to_string("page", &(), None).expect("render"), "v1");

    write(dir.path(), "page.html", "{% if %}");
    let err = engine.render_to_string("page", &(), None).unwrap_err();
    assert!(matches!(err, RenderError::Compile { .. }), "got: {err}");
    assert!(engine.has_template("page"), "previous set must survive a failed reload");

    write(dir.path(), "page.html", "v2");
    assert_eq!(engine.render_to_string("page", &(), None).expect("render"), "v2");
}

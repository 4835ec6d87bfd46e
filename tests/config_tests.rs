use std::io::Write;

use dada_studio::config::from_yaml_file;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

const MINIMAL: &str = r#"
site:
  base-url: "https://example.com"
content-api:
  rest-url: "https://db.example.com/rest/v1"
  auth-url: "https://db.example.com/auth/v1"
  api-key: "anon-key"
"#;

#[test]
fn minimal_config_fills_defaults() {
    let file = write_config(MINIMAL);
    let cfg = from_yaml_file(file.path()).expect("parse");
    cfg.validate().expect("valid");

    assert_eq!(cfg.site.base_url, "https://example.com");
    assert_eq!(cfg.site.page_ttl_secs, 300);
    assert_eq!(cfg.site.bind_addr.port(), 8080);

    // Showcase defaults mirror the production motion tuning.
    assert!((cfg.showcase.tilt.max_degrees - 15.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.tilt.spring.stiffness - 150.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.tilt.spring.damping - 15.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.marquee.spring.stiffness - 400.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.marquee.spring.damping - 50.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.parallax.scroll_range_px - 500.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.parallax.travel_px - 200.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.parallax.fade_range_px - 300.0).abs() < f32::EPSILON);
    assert_eq!(cfg.showcase.stack.cards, 3);
}

#[test]
fn overrides_are_honored() {
    let file = write_config(
        r#"
site:
  base-url: "https://example.com"
  page-ttl-secs: 60
content-api:
  rest-url: "https://db.example.com/rest/v1"
  auth-url: "https://db.example.com/auth/v1"
  api-key: "anon-key"
showcase:
  tilt:
    max-degrees: 10
    spring:
      stiffness: 200
      damping: 20
"#,
    );
    let cfg = from_yaml_file(file.path()).expect("parse");
    cfg.validate().expect("valid");
    assert_eq!(cfg.site.page_ttl_secs, 60);
    assert!((cfg.showcase.tilt.max_degrees - 10.0).abs() < f32::EPSILON);
    assert!((cfg.showcase.tilt.spring.stiffness - 200.0).abs() < f32::EPSILON);
}

#[test]
fn missing_file_surfaces_as_an_io_error() {
    let err = from_yaml_file(std::path::Path::new("does-not-exist.yaml"))
        .expect_err("missing file");
    assert!(matches!(err, dada_studio::Error::Io(_)));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config(
        r#"
site:
  base-url: "https://example.com"
  page-ttl: 60
content-api:
  rest-url: "https://db.example.com/rest/v1"
  auth-url: "https://db.example.com/auth/v1"
  api-key: "anon-key"
"#,
    );
    assert!(from_yaml_file(file.path()).is_err());
}

#[test]
fn nonpositive_spring_fails_validation() {
    let file = write_config(
        r#"
site:
  base-url: "https://example.com"
content-api:
  rest-url: "https://db.example.com/rest/v1"
  auth-url: "https://db.example.com/auth/v1"
  api-key: "anon-key"
showcase:
  marquee:
    spring:
      stiffness: 0
"#,
    );
    let cfg = from_yaml_file(file.path()).expect("parse");
    assert!(cfg.validate().is_err());
}

#[test]
fn empty_api_key_fails_validation() {
    let file = write_config(
        r#"
site:
  base-url: "https://example.com"
content-api:
  rest-url: "https://db.example.com/rest/v1"
  auth-url: "https://db.example.com/auth/v1"
  api-key: ""
"#,
    );
    let cfg = from_yaml_file(file.path()).expect("parse");
    assert!(cfg.validate().is_err());
}

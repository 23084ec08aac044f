//! Command-line binary tests

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const CONFIG: &str = r#"{
    "transforms": [{
        "selector": "img.photo",
        "extract": {
            "pattern": "^(.+)/([^/]+)\\.([^.]+)$",
            "groups": {"base": 1, "name": 2, "ext": 3}
        },
        "urlTemplate": "{base}/{name}-{width}.{format}",
        "widths": [480, 960],
        "type": "srcset",
        "loading": "lazy"
    }]
}"#;

const HTML: &str = r#"<p><img class="photo" src="/img/dog.jpg" alt="Dog"><img src="/img/icon.png"></p>"#;

fn responsify(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_responsify"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            // The binary may exit before reading stdin
            let _ = pipe.write_all(input.as_bytes());
        }
    }

    child.wait_with_output().unwrap()
}

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("config.json");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_stdin_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = responsify(&["--config", &config], Some(HTML));
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        r#"<p><img class="photo" alt="Dog" src="/img/dog-960.jpg" srcset="/img/dog-480.jpg 480w, /img/dog-960.jpg 960w" loading="lazy"><img src="/img/icon.png"></p>"#
    );
}

#[test]
fn test_file_to_file_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);
    let input = dir.path().join("in.html");
    let output_path = dir.path().join("out.json");
    fs::write(&input, HTML).unwrap();

    let output = responsify(
        &[
            "-i",
            input.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
            "-c",
            &config,
            "--format",
            "json",
        ],
        None,
    );
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["stats"]["imagesFound"], 2);
    assert_eq!(json["stats"]["imagesTransformed"], 1);
    assert!(json["html"].as_str().unwrap().contains("dog-480.jpg 480w"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), CONFIG);

    let output = responsify(&["-c", &config, "-v"], Some(HTML));
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("images transformed: 1"));
}

#[test]
fn test_invalid_config_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), r#"{"transforms": []}"#);

    let output = responsify(&["-c", &config], Some(HTML));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Invalid configuration"));
    assert!(stderr.contains("  - Transforms array cannot be empty"));
}

#[test]
fn test_missing_config_and_bad_html() {
    let output = responsify(&["-i", "page.html"], None);
    assert_eq!(output.status.code(), Some(1));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let output = responsify(&["-c", missing.to_str().unwrap()], Some(HTML));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Could not read config file"));

    let config = write_config(dir.path(), CONFIG);
    let output = responsify(&["-c", &config], Some(r#"<img class="photo" src="a.jpg" <b>"#));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Transformation failed"));
}

#[test]
fn test_version_and_help() {
    let output = responsify(&["--version"], None);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));

    let output = responsify(&["--help"], None);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--config"));
}

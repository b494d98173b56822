use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const REPLY: &str = "```json
[
  {\"startTime\": \"00:01.000\", \"endTime\": \"00:02.500\", \"text\": \"Hello world\", \"emoji\": \"👋\"},
  {\"startTime\": \"00:00.200\", \"endTime\": \"00:00.900\", \"text\": \"Intro\"}
]
```";

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lyricframe-cli"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run lyricframe-cli")
}

fn import_project(dir: &Path) -> String {
    let reply = dir.join("reply.txt");
    std::fs::write(&reply, REPLY).unwrap();
    let project = dir.join("project.lyricframe.json");

    let output = run(&[
        "import",
        "--reply",
        reply.to_str().unwrap(),
        "--out",
        project.to_str().unwrap(),
        "--theme",
        "neon",
        "--aspect",
        "9:16",
    ]);
    assert!(
        output.status.success(),
        "import failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    project.to_string_lossy().to_string()
}

fn write_silent_wav(path: &Path, seconds: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(8000 * seconds) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn import_then_srt() {
    let dir = TempDir::new().unwrap();
    let project = import_project(dir.path());

    let output = run(&["srt", "--in", &project]);
    assert!(output.status.success());
    let srt = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,200 --> 00:00:00,900\nIntro\n\n\
         2\n00:00:01,000 --> 00:00:02,500\n👋 Hello world\n"
    );
}

#[test]
fn frame_plan_uses_project_aspect() {
    let dir = TempDir::new().unwrap();
    let project = import_project(dir.path());

    let output = run(&["frame", "--in", &project, "--time", "1.5"]);
    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["width"], 720);
    assert_eq!(plan["height"], 1280);
    assert_eq!(plan["captionIndex"], 1);

    let output = run(&["frame", "--in", &project, "--time", "1.5", "--preview"]);
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["width"], 640);
}

#[test]
fn export_writes_artifact() {
    let dir = TempDir::new().unwrap();
    let project = import_project(dir.path());
    let audio = dir.path().join("song.wav");
    write_silent_wav(&audio, 1);
    let out_dir = dir.path().join("out");

    let output = run(&[
        "export",
        "--in",
        &project,
        "--audio",
        audio.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--fps",
        "5",
    ]);
    assert!(
        output.status.success(),
        "export failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let artifact = std::fs::read_to_string(out_dir.join("song_lyrics.webm")).unwrap();
    assert_eq!(artifact.lines().count(), 5);
}

#[test]
fn missing_project_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    let output = run(&["srt", "--in", missing.to_str().unwrap()]);
    assert!(!output.status.success());
}

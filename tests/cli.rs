use std::path::Path;

use assert_cmd::Command;
use image::{DynamicImage, ImageBuffer, Rgb};
use jpgresize::processing::encode_jpeg;
use jpgresize::Quality;
use predicates::prelude::*;
use tempfile::TempDir;

fn jpgresize() -> Command {
    let mut cmd = Command::cargo_bin("jpgresize").unwrap();
    cmd.env_remove("JPGRESIZE_CONFIG");
    cmd
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 64]));
    let file = std::fs::File::create(path).unwrap();
    encode_jpeg(&DynamicImage::ImageRgb8(img), Quality::default(), file).unwrap();
}

#[test]
fn lists_presets() {
    jpgresize()
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("thumbnail"))
        .stdout(predicate::str::contains("150px"))
        .stdout(predicate::str::contains("800px"))
        .stdout(predicate::str::contains("1024px"))
        .stdout(predicate::str::contains("1600px"));
}

#[test]
fn resizes_folder_into_output_directory() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_jpeg(&src.path().join("wide.jpg"), 600, 300);
    write_jpeg(&src.path().join("tiny.jpeg"), 100, 50);

    jpgresize()
        .arg(src.path())
        .args(["--preset", "thumbnail", "--quiet", "--output"])
        .arg(out.path())
        .assert()
        .success();

    assert_eq!(
        image::image_dimensions(out.path().join("wide.jpg")).unwrap(),
        (150, 75)
    );
    assert_eq!(
        std::fs::read(src.path().join("tiny.jpeg")).unwrap(),
        std::fs::read(out.path().join("tiny.jpeg")).unwrap()
    );
}

#[test]
fn json_report() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_jpeg(&src.path().join("tall.jpg"), 200, 400);

    let output = jpgresize()
        .arg(src.path().join("tall.jpg"))
        .args(["-w", "100", "-q", "250", "--json", "-o"])
        .arg(out.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["resized"], 1);
    assert_eq!(report["images"][0]["output_width"], 50);
    assert_eq!(report["images"][0]["output_height"], 100);
    assert_eq!(report["images"][0]["orientation"], "portrait");
}

#[test]
fn dry_run_writes_nothing() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let target = out.path().join("resized");
    write_jpeg(&src.path().join("wide.jpg"), 2000, 1000);

    jpgresize()
        .arg(src.path())
        .args(["--dry-run", "--quiet", "-o"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("2000x1000 -> 800x400"));

    assert!(!target.exists());
}

#[test]
fn in_place_and_output_conflict() {
    let src = TempDir::new().unwrap();
    write_jpeg(&src.path().join("a.jpg"), 300, 200);

    jpgresize()
        .arg(src.path())
        .args(["--in-place", "--quiet", "--output", "elsewhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot both replace originals"));
}

#[test]
fn missing_inputs_fail() {
    jpgresize()
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input files"));

    let empty = TempDir::new().unwrap();
    jpgresize()
        .arg(empty.path())
        .args(["--quiet", "-o"])
        .arg(empty.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No JPEG files found"));
}

#[test]
fn example_config_round_trips_through_validation() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("jpgresize.toml");

    jpgresize()
        .arg("example-config")
        .arg("--output")
        .arg(&config)
        .assert()
        .success();

    jpgresize()
        .arg("config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Width: 800px"))
        .stdout(predicate::str::contains("Quality: 90"));
}

#[test]
fn config_file_sets_defaults() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config = src.path().join("settings.yaml");
    std::fs::write(
        &config,
        format!(
            "resize:\n  width: 120\noutput:\n  mode: directory\n  path: {:?}\n",
            out.path()
        ),
    )
    .unwrap();
    write_jpeg(&src.path().join("photo.jpg"), 480, 240);

    jpgresize()
        .arg(src.path().join("photo.jpg"))
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(
        image::image_dimensions(out.path().join("photo.jpg")).unwrap(),
        (120, 60)
    );
}

/// A home directory with an empty `Desktop/` that the desktop lookup resolves to
#[cfg(unix)]
fn fake_home() -> TempDir {
    let home = TempDir::new().unwrap();
    std::fs::create_dir(home.path().join("Desktop")).unwrap();
    let config_home = home.path().join(".config");
    std::fs::create_dir(&config_home).unwrap();
    std::fs::write(
        config_home.join("user-dirs.dirs"),
        "XDG_DESKTOP_DIR=\"$HOME/Desktop\"\n",
    )
    .unwrap();
    home
}

#[cfg(unix)]
fn with_home(cmd: &mut Command, home: &Path) {
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DESKTOP_DIR", home.join("Desktop"));
}

#[cfg(unix)]
fn desktop_folders(home: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(home.join("Desktop"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[cfg(unix)]
#[test]
fn defaults_to_new_desktop_folder() {
    let home = fake_home();
    let src = TempDir::new().unwrap();
    write_jpeg(&src.path().join("photo.jpg"), 1600, 800);

    let mut cmd = jpgresize();
    with_home(&mut cmd, home.path());
    cmd.arg(src.path()).arg("--quiet").assert().success();

    let folders = desktop_folders(home.path());
    assert_eq!(folders.len(), 1, "{:?}", folders);
    let folder = &folders[0];
    assert!(folder.is_dir());
    assert!(folder
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Resized Images "));
    assert_eq!(
        image::image_dimensions(folder.join("photo.jpg")).unwrap(),
        (800, 400)
    );
    assert_eq!(
        image::image_dimensions(src.path().join("photo.jpg")).unwrap(),
        (1600, 800)
    );
}

#[cfg(unix)]
#[test]
fn desktop_flag_wins_over_in_place() {
    let home = fake_home();
    let src = TempDir::new().unwrap();
    let photo = src.path().join("photo.jpg");
    write_jpeg(&photo, 600, 300);
    let before = std::fs::read(&photo).unwrap();

    let mut cmd = jpgresize();
    with_home(&mut cmd, home.path());
    cmd.arg(&photo)
        .args(["--width", "150", "--desktop", "--in-place", "--quiet"])
        .assert()
        .success();

    assert_eq!(std::fs::read(&photo).unwrap(), before);
    let folders = desktop_folders(home.path());
    assert_eq!(folders.len(), 1, "{:?}", folders);
    assert_eq!(
        image::image_dimensions(folders[0].join("photo.jpg")).unwrap(),
        (150, 75)
    );
}

#[test]
fn destination_flag_fills_in_for_config_without_path() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config = src.path().join("settings.yaml");
    std::fs::write(&config, "resize:\n  width: 120\noutput:\n  mode: directory\n").unwrap();
    let photo = src.path().join("photo.jpg");
    write_jpeg(&photo, 480, 240);

    jpgresize()
        .arg(&photo)
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(out.path())
        .assert()
        .success();
    assert_eq!(
        image::image_dimensions(out.path().join("photo.jpg")).unwrap(),
        (120, 60)
    );

    jpgresize()
        .arg(&photo)
        .args(["--quiet", "--in-place", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert_eq!(image::image_dimensions(&photo).unwrap(), (120, 60));

    jpgresize()
        .arg(&photo)
        .args(["--quiet", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("output.path"));
}

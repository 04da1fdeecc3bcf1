use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;

pub fn medex() -> Command {
    cargo_bin_cmd!("medex")
}

/// Create an empty collection layout (notes/ + media/) under `root`
pub fn create_collection(root: &Path) {
    fs::create_dir_all(root.join("notes")).unwrap();
    fs::create_dir_all(root.join("media")).unwrap();
}

/// Write a note file under notes/, creating deck directories as needed
pub fn write_note(root: &Path, rel: &str, content: &str) {
    let path = root.join("notes").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Place a media file into the collection's media storage
pub fn write_media(root: &Path, name: &str) {
    fs::write(root.join("media").join(name), format!("content of {}", name)).unwrap();
}

#[allow(dead_code)]
pub fn dest_names(dest: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dest)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads a file with one class name per line so that the class ids coming out of the
/// detector can be given meaning. Blank lines are skipped.
pub fn read_classes_txt_file(filepath: &Path) -> io::Result<Vec<String>> {
    BufReader::new(File::open(filepath)?)
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| line.map(|l| l.trim().to_string()))
        .collect()
}

/// The label shown for a class id, falling back to the id itself when no name is known.
pub fn class_label(class_names: &[String], class_id: usize) -> String {
    match class_names.get(class_id) {
        Some(name) => name.clone(),
        None => format!("Class {}", class_id),
    }
}

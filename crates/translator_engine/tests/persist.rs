use std::fs;

use tempfile::TempDir;
use translator_engine::{ensure_output_dir, safe_file_name, AtomicFileWriter, PersistError};

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn download_overwrites_previous_result() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("book_Japanese.md", "第一版".as_bytes()).unwrap();
    assert_eq!(first.file_name().unwrap(), "book_Japanese.md");
    assert_eq!(fs::read_to_string(&first).unwrap(), "第一版");

    let second = writer.write("book_Japanese.md", "第二版".as_bytes()).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "第二版");
}

#[test]
fn output_path_that_is_a_file_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("book.md", b"data");
    assert!(matches!(result, Err(PersistError::OutputDir(_))));
    assert!(!file_path.with_file_name("book.md").exists());
}

#[test]
fn server_names_cannot_escape_the_output_dir() {
    assert_eq!(safe_file_name("../../etc/passwd").unwrap(), "passwd");
    assert_eq!(safe_file_name("dir\\book_French.md").unwrap(), "book_French.md");
    assert!(safe_file_name("..").is_err());
    assert!(safe_file_name("out/").is_err());

    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("out"));
    let path = writer.write("../escape.md", b"x").unwrap();
    assert_eq!(path, temp.path().join("out").join("escape.md"));
}

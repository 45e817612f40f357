use std::fs;

use codecontext::{DomainError, SourceLoader};
use tempfile::tempdir;

#[tokio::test]
async fn loads_matching_files_sorted_with_relative_paths() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("project");
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join(".cache")).unwrap();

    fs::write(root.join("src/print.c"), "int print(void);\n").unwrap();
    fs::write(root.join("src/dymo.h"), "#define WIDTH 62\n").unwrap();
    fs::write(root.join("README.md"), "# labels\n").unwrap();
    fs::write(root.join(".cache/stale.c"), "int stale;\n").unwrap();
    fs::write(root.join("src/latin1.c"), [0x69u8, 0x6e, 0x74, 0x20, 0xe9, 0x3b]).unwrap();

    let loader = SourceLoader::with_extensions(["c", "h"]);
    let documents = loader.load(&root).await.expect("load");

    let files: Vec<&str> = documents.iter().map(|d| d.file()).collect();
    assert_eq!(files, vec!["src/dymo.h", "src/print.c"]);
    assert_eq!(documents[1].content(), "int print(void);\n");
}

#[tokio::test]
async fn gitignored_files_are_skipped() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("project");
    fs::create_dir_all(root.join("build")).unwrap();

    fs::write(root.join(".gitignore"), "build/\n").unwrap();
    fs::write(root.join("main.c"), "int main(void) { return 0; }\n").unwrap();
    fs::write(root.join("build/generated.c"), "int generated;\n").unwrap();

    let documents = SourceLoader::new().load(&root).await.expect("load");

    let files: Vec<&str> = documents.iter().map(|d| d.file()).collect();
    assert_eq!(files, vec!["main.c"]);
}

#[tokio::test]
async fn single_file_root_is_loaded() {
    let dir = tempdir().expect("tempdir");
    let file = dir.path().join("lprint.c");
    fs::write(&file, "void lprint(void) {}\n").unwrap();

    let documents = SourceLoader::new().load(&file).await.expect("load");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].file(), "lprint.c");
}

#[tokio::test]
async fn missing_root_is_invalid_input() {
    let dir = tempdir().expect("tempdir");

    let result = SourceLoader::new().load(&dir.path().join("absent")).await;

    assert!(matches!(result, Err(DomainError::InvalidInput(_))));
}

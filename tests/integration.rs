use std::path::Path;
use std::process::{Command, Output};

fn altlookup_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_altlookup"));
    cmd.current_dir(root);
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "altlookup failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// The `<digest>.adoc` names `digest` prints for `index.adoc`, in document order.
fn digest_names(root: &Path) -> Vec<String> {
    let output = altlookup_cmd(root).args(["digest", "index.adoc"]).output().unwrap();
    assert_success(&output);
    return String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| return line.rsplit('\t').next().unwrap().to_string())
        .collect();
}

const GUIDE: &str = "= Guide\n\nSearch an index:\n\n[source,console]\n----\nGET /<index>/_search\n----\n";

#[test]
fn digest_prints_location_language_and_file_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);

    let output = altlookup_cmd(dir.path()).args(["digest", "index.adoc"]).output().unwrap();
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().unwrap();
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(*fields.first().unwrap(), "index.adoc: line 6");
    assert_eq!(*fields.get(1).unwrap(), "console");
    let name = fields.get(2).unwrap();
    assert_eq!(name.len(), "0123456789abcdef0123456789abcdef.adoc".len());
    assert!(name.ends_with(".adoc"));
}

#[test]
fn empty_lookups_render_identically_to_none() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);

    let plain = altlookup_cmd(dir.path()).args(["convert", "index.adoc", "--out-dir", "."]).output().unwrap();
    assert_success(&plain);
    let without = std::fs::read_to_string(dir.path().join("index.html")).unwrap();

    let empty = altlookup_cmd(dir.path()).args(["convert", "index.adoc", "--lookups", ""]).output().unwrap();
    assert_success(&empty);
    let with_empty = std::fs::read_to_string(dir.path().join("index.html")).unwrap();

    assert_eq!(without, with_empty);
    assert!(!without.contains("has-"));
}

#[test]
fn convert_injects_alternative_and_writes_report_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);
    std::fs::create_dir_all(dir.path().join("alt/csharp")).unwrap();
    std::fs::create_dir_all(dir.path().join("alt/java")).unwrap();
    let name = digest_names(dir.path()).into_iter().next().unwrap();
    write(
        dir.path(),
        &format!("alt/js/{name}"),
        "[source,js]\n----\nclient.search({ index: 'my-index' })\n----\n",
    );

    let output = altlookup_cmd(dir.path())
        .args([
            "convert",
            "index.adoc",
            "--lookups",
            "console,js,alt/js\nconsole,csharp,alt/csharp\nconsole,java,alt/java",
            "--report",
            "report.adoc",
            "--summary",
            "summary.json",
        ])
        .output()
        .unwrap();
    assert_success(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Converted 1 documents, 1 listings checked (0 errors, 0 warnings)"), "{stderr}");

    let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(html.contains("listingblock alternative"), "{html}");
    assert!(html.contains("has-js"));
    assert!(!html.contains("has-csharp"));
    assert!(html.find("client.search").unwrap() < html.find("_search").unwrap());
    assert!(!html.contains("\\&lt;"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(
        summary,
        serde_json::json!({
            "console": {
                "total": 1,
                "alternatives": {
                    "js": { "found": 1 },
                    "csharp": { "found": 0 },
                    "java": { "found": 0 }
                }
            }
        })
    );

    let report = std::fs::read_to_string(dir.path().join("report.adoc")).unwrap();
    assert!(report.starts_with("= Alternatives Report\n"));
    assert!(report.contains(&format!("=== index.adoc: line 6: {name}\n")));
    assert!(report.contains("GET /\\<index>/_search"));
    assert!(report.contains("| js | csharp | java \n"));
    assert!(report.contains("| &check; | &cross; | &cross; \n"));
}

#[test]
fn config_file_supplies_lookups() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);
    let name = digest_names(dir.path()).into_iter().next().unwrap();
    write(dir.path(), &format!("alt/js/{name}"), "[source,js]\n----\nclient.search()\n----\n");
    write(
        dir.path(),
        ".altlookup.toml",
        "lookups = \"console,js,alt/js\"\nsummary = \"summary.json\"\n",
    );

    let output = altlookup_cmd(dir.path()).args(["convert", "index.adoc"]).output().unwrap();
    assert_success(&output);

    let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(html.contains("has-js"));
    let summary = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
    assert!(summary.contains("\"found\": 1"));
}

#[test]
fn document_attribute_enables_lookups() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "index.adoc",
        "= Guide\n:alternative_language_lookups: console,js,alt/js\n:alternative_language_report: report.adoc\n\n\
         [source,console]\n----\nGET /\n----\n",
    );
    std::fs::create_dir_all(dir.path().join("alt/js")).unwrap();

    let output = altlookup_cmd(dir.path()).args(["convert", "index.adoc"]).output().unwrap();
    assert_success(&output);

    let report = std::fs::read_to_string(dir.path().join("report.adoc")).unwrap();
    assert!(report.contains("| &cross; \n"));
}

#[test]
fn bad_lookup_config_logs_one_error_and_still_converts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);

    let output = altlookup_cmd(dir.path())
        .args(["convert", "index.adoc", "--lookups", "console,js,missing", "--summary", "summary.json"])
        .output()
        .unwrap();
    assert_success(&output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("alternative language lookups disabled").count(), 1, "{stderr}");
    assert!(stderr.contains("missing"));
    assert!(stderr.contains("(1 errors, 0 warnings)"));
    assert!(dir.path().join("index.html").exists());
    assert!(!dir.path().join("summary.json").exists());
}

#[test]
fn config_file_error_names_the_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);
    write(dir.path(), ".altlookup.toml", "summary = \"summary.json\"\nlookups = \"console,js,missing\"\n");

    let output = altlookup_cmd(dir.path()).args(["convert", "index.adoc"]).output().unwrap();
    assert_success(&output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(".altlookup.toml: line 2: "), "{stderr}");
    assert!(stderr.contains("alternative language lookups disabled"));
}

#[test]
fn missing_top_level_include_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", "= Guide\n\ninclude::nowhere.adoc[]\n");

    let output = altlookup_cmd(dir.path()).args(["convert", "index.adoc"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nowhere.adoc"), "{stderr}");
}

#[test]
fn malformed_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.adoc", GUIDE);
    write(dir.path(), ".altlookup.toml", "lookup = 3\n");

    let output = altlookup_cmd(dir.path()).args(["convert", "index.adoc"]).output().unwrap();
    assert!(!output.status.success());
}

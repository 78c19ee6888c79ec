use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../schemock-resolve/tests/fixtures")
        .join(name)
}

fn schemock(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemock"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run schemock")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn formats_lists_builtin_parsers() {
    let dir = tempfile::tempdir().unwrap();
    let output = schemock(dir.path(), &["formats"]);
    assert!(output.status.success());

    let listed = stdout(&output);
    for format in ["prisma", "graphql", "sql", "openapi", "json-schema", "canonical"] {
        assert!(listed.lines().any(|line| line == format), "missing {format}");
    }
}

#[test]
fn detect_prints_the_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture("blog.prisma");
    let output = schemock(dir.path(), &["detect", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "prisma");

    let output = schemock(dir.path(), &["detect", "--content-only", path.to_str().unwrap()]);
    assert_eq!(stdout(&output).trim(), "prisma");
}

#[test]
fn resolve_writes_one_report_per_schema() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out/reports.json");
    let blog = fixture("blog.prisma");
    let shop = fixture("shop.sql");

    let output = schemock(
        dir.path(),
        &[
            "resolve",
            blog.to_str().unwrap(),
            shop.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let reports: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["format"], "prisma");
    assert_eq!(
        reports[0]["output"]["generation_order"],
        serde_json::json!(["Post", "User"])
    );
    assert_eq!(reports[1]["format"], "sql");
    assert_ne!(reports[0]["run_id"], reports[1]["run_id"]);
}

#[test]
fn resolve_continues_past_unparseable_schemas() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.prisma");
    std::fs::write(&broken, "// nothing here\n").unwrap();
    let blog = fixture("blog.prisma");

    let output = schemock(
        dir.path(),
        &["resolve", broken.to_str().unwrap(), blog.to_str().unwrap()],
    );
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 1);
}

#[test]
fn resolve_continues_past_undecodable_schemas() {
    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("bad.prisma");
    std::fs::write(&binary, [0x6d, 0x6f, 0xff, 0xfe, 0x00]).unwrap();
    let blog = fixture("blog.prisma");

    let output = schemock(
        dir.path(),
        &["resolve", binary.to_str().unwrap(), blog.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["format"], "prisma");
}

#[test]
fn config_file_selects_the_strategy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("schemock.toml"),
        "[resolve]\nstrategy = \"partial-references\"\n",
    )
    .unwrap();
    let blog = fixture("blog.prisma");

    let output = schemock(dir.path(), &["resolve", blog.to_str().unwrap()]);
    assert!(output.status.success());
    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        reports[0]["output"]["resolution_plan"]["strategy"],
        "partial-references"
    );

    let output = schemock(
        dir.path(),
        &["resolve", blog.to_str().unwrap(), "--strategy", "no-such-strategy"],
    );
    assert!(!output.status.success());
}

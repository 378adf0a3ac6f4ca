use anyhow::{Result, bail};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn run_opa64(args: &[&str]) -> Result<String> {
    let mut me = std::env::current_exe()?;
    me.pop(); // chop off the file name
    me.pop(); // chop off `deps`
    me.push("opa64");
    let output = Command::new(&me).args(args).output()?;
    if !output.status.success() {
        bail!(
            "Failed to execute opa64 with: {:?}\n{}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8(output.stdout).unwrap())
}

const DATABASE: &str = r#"{
    "zip": {
        "table": {},
        "intrinsics": [{
            "op_raw": "zip1",
            "form": "vvv",
            "datatypes": ["8"],
            "intrinsic": "int8x8_t vzip1_s8(int8x8_t a, int8x8_t b)",
            "sequence": ["zip1 vd.8b,vn.8b,vm.8b"]
        }]
    },
    "sub": {
        "table": {
            "a55": [{
                "op_raw": "sub",
                "iclass": "general",
                "itype": "any",
                "variant": ["alu", "basic"],
                "latency": "1",
                "throughput": "2",
                "pipes": "i0/i1",
                "notes": ""
            }]
        }
    },
    "add": {
        "table": {}
    }
}"#;

/// A scratch directory with the database above and an empty configuration,
/// so that no user configuration leaks into the tests.
fn workspace() -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("db.json"), DATABASE)?;
    fs::write(dir.path().join("config.toml"), "")?;
    Ok(dir)
}

fn path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}

fn opcodes(records: &Value) -> Vec<&str> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["bf"]["op"].as_str().unwrap())
        .collect()
}

// Relinking a database prints the records sorted by opcode.
#[test]
fn relink_prints_sorted_records() -> Result<()> {
    let dir = workspace()?;
    let stdout = run_opa64(&[
        "relink",
        "--config",
        &path(&dir, "config.toml"),
        "--db",
        &path(&dir, "db.json"),
    ])?;
    let records: Value = serde_json::from_str(&stdout)?;
    assert_eq!(opcodes(&records), ["add", "sub", "zip1"]);

    let sub = &records[1];
    assert_eq!(sub["bf"]["ic"], "unknown");
    assert_eq!(sub["tb"].as_object().unwrap().len(), 0);

    let zip = &records[2];
    assert_eq!(zip["bf"]["ic"], "advsimd");
    assert_eq!(zip["bf"]["as"][0], "zip1 vd.8b,vn.8b,vm.8b");
    Ok(())
}

// The configuration file reaches the relink stage.
#[test]
fn relink_honors_config() -> Result<()> {
    let dir = workspace()?;
    fs::write(
        dir.path().join("config.toml"),
        "[relink]\nvector-shuffle-opcodes = []\n",
    )?;
    let output = path(&dir, "records.json");
    run_opa64(&[
        "relink",
        "--config",
        &path(&dir, "config.toml"),
        "--db",
        &path(&dir, "db.json"),
        "-o",
        &output,
    ])?;
    let records: Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(records[2]["bf"]["ic"], "unknown");
    Ok(())
}

#[test]
fn relink_missing_database_fails() -> Result<()> {
    let dir = workspace()?;
    assert!(
        run_opa64(&[
            "relink",
            "--config",
            &path(&dir, "config.toml"),
            "--db",
            &path(&dir, "missing.json"),
        ])
        .is_err(),
        "shall fail"
    );
    Ok(())
}

#[test]
fn invalid_config_fails() -> Result<()> {
    let dir = workspace()?;
    fs::write(dir.path().join("config.toml"), "[relink]\nseparator = \";\"\n")?;
    assert!(
        run_opa64(&[
            "relink",
            "--config",
            &path(&dir, "config.toml"),
            "--db",
            &path(&dir, "db.json"),
        ])
        .is_err(),
        "shall fail"
    );
    Ok(())
}

// Missing documents are reported on stderr; the database is still written.
#[test]
fn parse_without_documents() -> Result<()> {
    let dir = workspace()?;
    let stdout = run_opa64(&[
        "parse",
        "--config",
        &path(&dir, "config.toml"),
        "--dir",
        &path(&dir, "downloads"),
        "--doc",
        "intrinsics,table.z9",
    ])?;
    let db: Value = serde_json::from_str(&stdout)?;
    assert_eq!(db, serde_json::json!({}));
    Ok(())
}

#[test]
fn parse_tables() -> Result<()> {
    let dir = workspace()?;
    let downloads = dir.path().join("downloads");
    fs::create_dir(&downloads)?;
    fs::write(
        downloads.join("arm_cortex_a55_software_optimization_guide_v3.pdf.json"),
        r#"[{"page": 9, "rows": [
            ["Instruction Group", "AArch64 Instructions", "Exec Latency", "Execution Throughput", "Utilized Pipelines", "Notes"],
            ["ALU, basic", "ADD{S}", "1", "2", "I0/I1", ""]
        ]}]"#,
    )?;
    let output = path(&dir, "tables.json");
    run_opa64(&[
        "parse",
        "--config",
        &path(&dir, "config.toml"),
        "--dir",
        downloads.to_str().unwrap(),
        "--doc",
        "table.a55",
        "-o",
        &output,
    ])?;
    let db: Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    let keys = db.as_object().unwrap().keys().collect::<Vec<_>>();
    assert_eq!(keys, ["add", "adds"]);
    assert_eq!(db["adds"]["table"]["a55"][0]["op_raw"], "adds");

    let records: Value = serde_json::from_str(&run_opa64(&[
        "relink",
        "--config",
        &path(&dir, "config.toml"),
        "--db",
        &output,
    ])?)?;
    assert_eq!(opcodes(&records), ["add", "adds"]);
    Ok(())
}

// `config new` writes a template once and refuses to overwrite it.
#[test]
fn config_new_refuses_to_overwrite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("nested").join("config.toml");
    let config = config.to_str().unwrap();

    let stdout = run_opa64(&["config", "new", config])?;
    assert!(stdout.contains("configuration template"));
    assert!(fs::read_to_string(config)?.contains("[relink]"));
    assert!(run_opa64(&["config", "new", config]).is_err(), "shall fail");

    // the template is a valid configuration
    let db = dir.path().join("db.json");
    fs::write(&db, DATABASE)?;
    run_opa64(&["relink", "--config", config, "--db", db.to_str().unwrap()])?;
    assert!(Path::new(config).exists());
    Ok(())
}

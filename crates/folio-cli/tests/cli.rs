use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

fn folio() -> Command {
    Command::cargo_bin("folio").unwrap()
}

/// Config file whose template store lives inside `dir`.
fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.json");
    let config = serde_json::json!({
        "templates": { "store_path": dir.join("templates.json") }
    });
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

/// Single-page PDF with one text line per entry, top to bottom.
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut operations = vec![Operation::new("BT", vec![])];
    operations.push(Operation::new(
        "Tf",
        vec![Object::Name(b"F1".to_vec()), Object::Integer(10)],
    ));
    operations.push(Operation::new(
        "Td",
        vec![Object::Integer(50), Object::Integer(780)],
    ));
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(0), Object::Integer(-20)],
            ));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn test_help_lists_commands() {
    folio()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("templates"));
}

#[test]
fn test_extract_missing_file() {
    folio()
        .args(["extract", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_flowing_statement() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let pdf = dir.path().join("statement.pdf");
    write_pdf(&pdf, &["01 Jan 2024", "Coffee Shop RM 12.50", "02 Jan 2024 Rent, March -RM 900.00"]);

    folio()
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&pdf)
        .args(["--kind", "flowing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Date,Description,Amount"))
        .stdout(predicate::str::contains("01/01/2024,Coffee Shop,12.50"))
        .stdout(predicate::str::contains("02/01/2024,\"Rent, March\",-900.00"));
}

#[test]
fn test_extract_tabular_statement_to_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let pdf = dir.path().join("tabular.pdf");
    let out = dir.path().join("out.csv");
    write_pdf(
        &pdf,
        &[
            "STATEMENT DATE : 29/02/24",
            "ACCOUNT TRANSACTIONS",
            "01/02 GROCERY STORE 45.00- 1,234.56",
            "03/02 SALARY 3,000.00+ 4,234.56",
            "ENDING BALANCE",
        ],
    );

    folio()
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&pdf)
        .args(["--kind", "tabular", "-o"])
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        csv,
        "Date,Description,Amount\n01/02/2024,GROCERY STORE,-45.00\n03/02/2024,SALARY,3000.00\n"
    );
}

#[test]
fn test_templates_roundtrip_and_invoice_extract() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    folio()
        .arg("-c")
        .arg(&config)
        .args([
            "templates",
            "add",
            "acme",
            "--supplier",
            r"(ACME \w+)",
            "--number",
            r"Invoice No:\s*([\w\s-]+)",
            "--export-name",
            "ACME Trading Sdn Bhd",
        ])
        .assert()
        .success();

    folio()
        .arg("-c")
        .arg(&config)
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme"))
        .stdout(predicate::str::contains("Supplier Name, Document Number"));

    let pdf = dir.path().join("invoice.pdf");
    write_pdf(&pdf, &["ACME Trading", "Invoice No: INV - 2024 - 001"]);

    folio()
        .arg("-c")
        .arg(&config)
        .arg("extract")
        .arg(&pdf)
        .args(["--kind", "invoice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "invoice.pdf,ACME Trading Sdn Bhd,,INV-2024-001,,acme",
        ));

    folio()
        .arg("-c")
        .arg(&config)
        .arg("classify")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected template"));

    folio()
        .arg("-c")
        .arg(&config)
        .args(["templates", "remove", "acme"])
        .assert()
        .success();

    folio()
        .arg("-c")
        .arg(&config)
        .args(["templates", "show", "acme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template not found"));
}

#[test]
fn test_templates_add_rejects_invalid_pattern() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    folio()
        .arg("-c")
        .arg(&config)
        .args(["templates", "add", "broken", "--total", "(unclosed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pattern"));

    assert!(!dir.path().join("templates.json").exists());
}

#[test]
fn test_batch_sorted_by_date() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    write_pdf(&dir.path().join("a.pdf"), &["05 Mar 2024 Rent RM 900.00"]);
    write_pdf(&dir.path().join("b.pdf"), &["02 Jan 2024 Coffee RM 4.50"]);
    let pattern = dir.path().join("*.pdf");

    let assert = folio()
        .arg("-c")
        .arg(&config)
        .arg("batch")
        .arg(pattern.to_string_lossy().as_ref())
        .args(["--kind", "flowing", "--sort-by-date"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(
        stdout,
        "Date,Description,Amount\n02/01/2024,Coffee,4.50\n05/03/2024,Rent,900.00\n"
    );
}

#[test]
fn test_batch_skips_unreadable_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    std::fs::write(dir.path().join("a.pdf"), b"not a pdf").unwrap();
    write_pdf(&dir.path().join("b.pdf"), &["02 Jan 2024 Coffee RM 4.50"]);
    let pattern = dir.path().join("*.pdf");

    folio()
        .arg("-c")
        .arg(&config)
        .arg("batch")
        .arg(pattern.to_string_lossy().as_ref())
        .args(["--kind", "flowing"])
        .assert()
        .success()
        .stdout(predicate::str::diff("Date,Description,Amount\n02/01/2024,Coffee,4.50\n"))
        .stderr(predicate::str::contains("a.pdf"))
        .stderr(predicate::str::contains("Processed 1/2 files"));
}

#[test]
fn test_batch_fail_fast_stops() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    std::fs::write(dir.path().join("a.pdf"), b"not a pdf").unwrap();
    write_pdf(&dir.path().join("b.pdf"), &["02 Jan 2024 Coffee RM 4.50"]);
    let pattern = dir.path().join("*.pdf");

    folio()
        .arg("-c")
        .arg(&config)
        .arg("batch")
        .arg(pattern.to_string_lossy().as_ref())
        .args(["--kind", "flowing", "--fail-fast"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to process"));
}

#[test]
fn test_peek_orders_files() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    write_pdf(&dir.path().join("a.pdf"), &["Statement 01/06/2024 to 30/06/2024"]);
    write_pdf(&dir.path().join("b.pdf"), &["Statement 01/05/2024 to 31/05/2024"]);
    let pattern = dir.path().join("*.pdf");

    let assert = folio()
        .arg("-c")
        .arg(&config)
        .arg("peek")
        .arg(pattern.to_string_lossy().as_ref())
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("01/05/2024 - 31/05/2024"));
    assert!(lines[1].starts_with("01/06/2024 - 30/06/2024"));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    folio()
        .arg("-c")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    folio()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "classification.min_score", "10"])
        .assert()
        .success();

    folio()
        .arg("-c")
        .arg(&config)
        .args(["config", "get", "classification.min_score"])
        .assert()
        .success()
        .stdout(predicate::str::diff("10\n"));

    folio()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "classification.nope", "1"])
        .assert()
        .failure();
}

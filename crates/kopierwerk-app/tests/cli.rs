// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integration tests for the `kopierwerk` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("kopierwerk").unwrap()
}

/// Create a PDF with `pages` pages, each showing its number in Helvetica.
fn sample_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let content = format!("BT /F1 18 Tf 72 720 Td (Page {number}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(i64::from(pages)),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

struct Workspace {
    dir: TempDir,
    source: PathBuf,
    target: PathBuf,
}

fn workspace(pages: u32) -> Workspace {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.pdf");
    std::fs::write(&source, sample_pdf(pages)).unwrap();
    let target = dir.path().join("copy.pdf");
    Workspace { dir, source, target }
}

fn output_pages(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

#[test]
fn help_lists_underscore_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--file_input"))
        .stdout(predicate::str::contains("--wm_text_rotation"))
        .stdout(predicate::str::contains("--allow_annotations"));
}

#[test]
fn text_watermark_copy_succeeds() {
    let ws = workspace(3);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "CONFIDENTIAL", "--wm_text", "do not forward"])
        .args(["--md_title", "Quarterly figures", "--allow_print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 page(s)"));

    assert_eq!(output_pages(&ws.target), 3);
    let bytes = std::fs::read(&ws.target).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(bytes.windows(8).any(|window| window == b"/Encrypt"));
}

#[test]
fn encryption_password_is_required_to_open_the_copy() {
    let ws = workspace(2);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "RESTRICTED", "--encryption_password", "secret", "--allow_print"])
        .assert()
        .success();

    let output = Document::load(&ws.target).unwrap();
    assert!(output.is_encrypted());
    let encrypt = output.get_encrypted().unwrap();
    assert_eq!(encrypt.get(b"V").unwrap().as_i64().unwrap(), 4);
    assert_eq!(encrypt.get(b"R").unwrap().as_i64().unwrap(), 4);
    assert!(!encrypt.get(b"EncryptMetadata").unwrap().as_bool().unwrap());
    let p = encrypt.get(b"P").unwrap().as_i64().unwrap();
    assert_ne!(p & (1 << 2), 0);

    let mut locked = Document::load(&ws.target).unwrap();
    assert!(locked.decrypt("wrong").is_err());
    let mut unlocked = Document::load(&ws.target).unwrap();
    unlocked.decrypt("secret").unwrap();
    assert_eq!(unlocked.get_pages().len(), 2);
}

#[test]
fn tiny_font_size_is_rejected() {
    let ws = workspace(1);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "DRAFT", "--wm_font_size", "0.000001"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("font_size"));
}

#[test]
fn image_watermark_with_ranges() {
    let ws = workspace(5);
    let image = ws.dir.path().join("logo.png");
    image::RgbaImage::from_pixel(30, 10, image::Rgba([0, 0, 160, 200]))
        .save(&image)
        .unwrap();

    cmd()
        .arg("--file_input")
        .arg(&ws.source)
        .arg("--file_output")
        .arg(&ws.target)
        .arg("--wm_image")
        .arg(&image)
        .args(["--ranges", "5,1-2", "--wm_opacity", "0.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 page(s)"));

    assert_eq!(output_pages(&ws.target), 3);
}

#[test]
fn missing_watermark_is_a_validation_error() {
    let ws = workspace(1);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("--wm_text"));
}

#[test]
fn text_and_image_together_are_rejected() {
    let ws = workspace(1);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "DRAFT", "--wm_image"])
        .arg(&ws.source)
        .assert()
        .code(2);
}

#[test]
fn out_of_range_opacity_is_rejected() {
    let ws = workspace(1);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "DRAFT", "--wm_opacity", "1.5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("opacity"));
}

#[test]
fn range_past_the_end_exits_with_page_selection_code() {
    let ws = workspace(2);
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "DRAFT", "--ranges", "2-4"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("page range"));
}

#[test]
fn unreadable_pdf_exits_with_source_code() {
    let ws = workspace(1);
    std::fs::write(&ws.source, b"this is not a pdf").unwrap();
    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .args(["--wm_text", "DRAFT"])
        .assert()
        .code(4);
}

#[test]
fn options_file_is_layered_under_the_command_line() {
    let ws = workspace(2);
    let options = ws.dir.path().join("options.json");
    let json = serde_json::json!({
        "watermark_text": ["FROM FILE"],
        "page_ranges": "2",
        "opacity": 0.2,
        "metadata": { "author": "Records" },
    });
    std::fs::write(&options, json.to_string()).unwrap();

    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .arg("--config")
        .arg(&options)
        .args(["--ranges", "1-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 page(s)"));

    assert_eq!(output_pages(&ws.target), 2);
}

#[test]
fn malformed_options_file_exits_with_options_code() {
    let ws = workspace(1);
    let options = ws.dir.path().join("options.json");
    std::fs::write(&options, "{ \"opacity\": ").unwrap();

    cmd()
        .arg("-i")
        .arg(&ws.source)
        .arg("-o")
        .arg(&ws.target)
        .arg("--config")
        .arg(&options)
        .assert()
        .code(8);
}

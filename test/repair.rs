// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::LayoutFixture;

use anyhow::Result;
use deskmend::{repair::Error, Outcome, Progress, Repairer, Scan};
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{env::current_dir, fs::metadata};

fn fixture() -> Result<LayoutFixture> {
    LayoutFixture::new(current_dir()?.join("home"))
}

fn finished(scan: Scan) -> deskmend::Report {
    match scan {
        Scan::Finished(report) => report,
        Scan::MissingBinaryDir => panic!("binary directory should exist"),
    }
}

#[sealed_test]
fn repair_stale_exec_in_versioned_folder() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.1.0/app")?;
    fixture.install("app-2.1.0/icon.png")?;
    let entry = fixture.add_entry(
        "app.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Type=Application
            Name=App
            Exec={bin}/app-1.0.0/app
            Icon={bin}/app-2.1.0/icon.png
        "#},
    )?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    let expect = formatdoc! {r#"
        [Desktop Entry]
        Type=Application
        Name=App
        Exec={bin}/app-2.1.0/app
        Icon={bin}/app-2.1.0/icon.png
    "#};
    assert_eq!(fixture.read_entry("app.desktop")?, expect);
    assert!(report.updated().contains(&entry));
    assert!(report.checked().contains(&entry));
    assert!(report.not_found().is_empty());

    Ok(())
}

#[sealed_test]
fn repair_stale_exec_with_version_only_folder() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("2.0/app")?;
    fixture.install("2.0/app.png")?;
    fixture.add_entry(
        "app.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/1.0/app
            Icon={bin}/2.0/app.png
        "#},
    )?;

    finished(Repairer::new(fixture.layout().clone()).scan()?);

    let expect = formatdoc! {r#"
        [Desktop Entry]
        Exec={bin}/2.0/app
        Icon={bin}/2.0/app.png
    "#};
    assert_eq!(fixture.read_entry("app.desktop")?, expect);

    Ok(())
}

#[sealed_test]
fn repair_both_keys() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("tool-3/tool")?;
    fixture.install("tool-3/share/tool.svg")?;
    fixture.add_entry(
        "tool.desktop",
        formatdoc! {r#"
            # keep me
            [Desktop Entry]
            Exec="{bin}/tool-2/tool" --profile=default %U
            Icon={bin}/tool-2/share/tool.svg

            [Desktop Action new]
            Exec={bin}/tool-2/tool --new
        "#},
    )?;

    let outcome = Repairer::new(fixture.layout().clone()).check_entry(
        fixture.layout().entry_dir.join("tool.desktop"),
    )?;

    assert!(matches!(
        outcome,
        Outcome::Done(ref progress) if progress.repairs.len() == 2 && progress.checked.is_empty()
    ));
    let expect = formatdoc! {r#"
        # keep me
        [Desktop Entry]
        Exec="{bin}/tool-3/tool" --profile=default %U
        Icon={bin}/tool-3/share/tool.svg

        [Desktop Action new]
        Exec={bin}/tool-2/tool --new
    "#};
    assert_eq!(fixture.read_entry("tool.desktop")?, expect);

    Ok(())
}

#[sealed_test]
fn placeholder_survives_icon_repair() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("viewer-0.9/viewer")?;
    fixture.install("viewer-0.9/viewer.png")?;
    fixture.add_entry(
        "viewer.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/viewer-0.9/viewer %f
            Icon={bin}/viewer-0.8/viewer.png
        "#},
    )?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    let expect = formatdoc! {r#"
        [Desktop Entry]
        Exec={bin}/viewer-0.9/viewer %f
        Icon={bin}/viewer-0.9/viewer.png
    "#};
    assert_eq!(fixture.read_entry("viewer.desktop")?, expect);
    assert_eq!(report.updated().len(), 1);

    Ok(())
}

#[sealed_test]
fn unrepairable_entry_is_left_untouched() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    let contents = formatdoc! {r#"
        [Desktop Entry]
        Exec={bin}/app-1.0.0/app
        Icon={bin}/app-1.0.0/icon.png
    "#};
    let entry = fixture.add_entry("app.desktop", &contents)?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    assert_eq!(fixture.read_entry("app.desktop")?, contents);
    assert!(report.not_found().contains(&entry));
    assert_eq!(report.not_found_names(), vec!["app.desktop".to_string()]);
    assert!(report.updated().is_empty());
    assert!(report.checked().is_empty());

    Ok(())
}

#[sealed_test]
fn exec_repair_survives_unrepairable_icon() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    let entry = fixture.add_entry(
        "app.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/app-1.0/app
            Icon={bin}/icons-1/app.png
        "#},
    )?;

    let repairer = Repairer::new(fixture.layout().clone());
    let outcome = repairer.check_entry(&entry)?;

    assert!(matches!(
        outcome,
        Outcome::NotFound { ref key, ref segment, ref progress }
            if key == "Icon" && segment == "icons-1" && progress.repairs.len() == 1
    ));
    let expect = formatdoc! {r#"
        [Desktop Entry]
        Exec={bin}/app-2.0/app
        Icon={bin}/icons-1/app.png
    "#};
    assert_eq!(fixture.read_entry("app.desktop")?, expect);

    // Exec is fine now, so a second scan only reports the icon.
    let report = finished(repairer.scan()?);
    assert!(report.checked().contains(&entry));
    assert!(report.not_found().contains(&entry));
    assert!(report.updated().is_empty());

    Ok(())
}

#[sealed_test]
fn exec_repair_and_unrepairable_icon_share_one_scan() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    let entry = fixture.add_entry(
        "app.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/app-1.0/app
            Icon={bin}/icons-1/app.png
        "#},
    )?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    assert!(report.updated().contains(&entry));
    assert!(report.not_found().contains(&entry));
    assert!(report.checked().is_empty());

    Ok(())
}

#[sealed_test]
fn foreign_entry_has_no_stats() -> Result<()> {
    let fixture = fixture()?;
    fixture.install("app-2.0/app")?;
    let contents = formatdoc! {r#"
        [Desktop Entry]
        Exec=/opt/vendor-1.0/app
        Icon=/opt/vendor-1.0/app.png
    "#};
    fixture.add_entry("vendor.desktop", &contents)?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    assert!(report.checked().is_empty());
    assert!(report.updated().is_empty());
    assert!(report.not_found().is_empty());
    assert_eq!(fixture.read_entry("vendor.desktop")?, contents);

    Ok(())
}

#[sealed_test]
fn valid_exec_counts_before_foreign_icon() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    let entry = fixture.add_entry(
        "app.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/app-2.0/app
            Icon=app-icon-from-theme
        "#},
    )?;

    let repairer = Repairer::new(fixture.layout().clone());
    let outcome = repairer.check_entry(&entry)?;
    assert_eq!(
        outcome,
        Outcome::Foreign {
            key: "Icon".into(),
            progress: Progress {
                checked: vec!["Exec".into()],
                repairs: Vec::new(),
            },
        }
    );

    let report = finished(repairer.scan()?);
    assert!(report.checked().contains(&entry));
    assert!(report.updated().is_empty());
    assert!(report.not_found().is_empty());

    Ok(())
}

#[sealed_test]
fn valid_exec_and_repaired_icon_count_twice() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    fixture.install("app-2.0/app.png")?;
    let entry = fixture.add_entry(
        "app.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/app-2.0/app
            Icon={bin}/app-1.0/app.png
        "#},
    )?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    assert!(report.checked().contains(&entry));
    assert!(report.updated().contains(&entry));
    assert!(report.not_found().is_empty());

    Ok(())
}

#[sealed_test]
fn missing_icon_key_is_skipped() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.add_entry(
        "noicon.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/app-1.0/app
        "#},
    )?;

    let repairer = Repairer::new(fixture.layout().clone());
    let outcome = repairer.check_entry(fixture.layout().entry_dir.join("noicon.desktop"))?;
    assert_eq!(outcome, Outcome::Invalid);

    let report = finished(repairer.scan()?);
    assert!(report.checked().is_empty());
    assert!(report.updated().is_empty());
    assert!(report.not_found().is_empty());

    Ok(())
}

#[sealed_test]
fn valid_entry_is_never_rewritten() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    fixture.install("app-2.0/app.png")?;
    let contents = format!(
        "[Desktop Entry]\r\nName = App   \r\nExec={bin}/app-2.0/app %U\r\nIcon={bin}/app-2.0/app.png"
    );
    let entry = fixture.add_entry("app.desktop", &contents)?;
    let before = metadata(&entry)?.modified()?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    assert_eq!(fixture.read_entry("app.desktop")?, contents);
    assert_eq!(metadata(&entry)?.modified()?, before);
    assert!(report.checked().contains(&entry));

    Ok(())
}

#[sealed_test]
fn malformed_and_unrelated_files_do_not_stop_scan() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    fixture.install("app-2.0/app.png")?;
    fixture.add_entry("broken.desktop", "Exec=nothing\nno header at all\n")?;
    fixture.add_entry("notes.txt", "[Desktop Entry]\nExec=/nope\nIcon=/nope\n")?;
    let good = fixture.add_entry(
        "good.desktop",
        formatdoc! {r#"
            [Desktop Entry]
            Exec={bin}/app-2.0/app
            Icon={bin}/app-2.0/app.png
        "#},
    )?;

    let report = finished(Repairer::new(fixture.layout().clone()).scan()?);

    assert_eq!(report.checked().iter().collect::<Vec<_>>(), vec![&good]);
    assert!(report.updated().is_empty());
    assert!(report.not_found().is_empty());

    Ok(())
}

#[sealed_test]
fn dry_run_writes_nothing() -> Result<()> {
    let fixture = fixture()?;
    let bin = fixture.bin();
    fixture.install("app-2.0/app")?;
    fixture.install("app-2.0/app.png")?;
    let contents = formatdoc! {r#"
        [Desktop Entry]
        Exec={bin}/app-1.0/app
        Icon={bin}/app-2.0/app.png
    "#};
    let entry = fixture.add_entry("app.desktop", &contents)?;

    let repairer = Repairer::new(fixture.layout().clone()).dry_run(true);
    let report = finished(repairer.scan()?);

    assert!(report.updated().contains(&entry));
    assert_eq!(fixture.read_entry("app.desktop")?, contents);

    Ok(())
}

#[sealed_test]
fn missing_binary_dir_is_created_and_ends_scan() -> Result<()> {
    let fixture = LayoutFixture::without_binary_dir(current_dir()?.join("home"))?;
    let bin = fixture.bin();
    let contents = formatdoc! {r#"
        [Desktop Entry]
        Exec={bin}/app-1.0/app
        Icon={bin}/app-1.0/app.png
    "#};
    fixture.add_entry("app.desktop", &contents)?;

    let dry = Repairer::new(fixture.layout().clone()).dry_run(true).scan()?;
    assert_eq!(dry, Scan::MissingBinaryDir);
    assert!(!fixture.layout().binary_dir.exists());

    let scan = Repairer::new(fixture.layout().clone()).run_check()?;
    assert_eq!(scan, Scan::MissingBinaryDir);
    assert!(fixture.layout().binary_dir.is_dir());
    assert_eq!(fixture.read_entry("app.desktop")?, contents);

    Ok(())
}

#[sealed_test]
fn missing_entry_dir_is_an_error() -> Result<()> {
    let fixture = fixture()?;
    std::fs::remove_dir(&fixture.layout().entry_dir)?;

    let result = Repairer::new(fixture.layout().clone()).scan();
    assert!(matches!(result, Err(Error::ReadEntryDir { .. })));

    Ok(())
}

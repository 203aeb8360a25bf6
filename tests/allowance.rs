//! End-To-End Resolution Tests
//!
//! These run the real filesystem path: encoded JPEG fixtures in a temp
//! directory, rules parsed from archives XML, CSV at the end.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use facsimile_core::{
    find_allowed_facsimile, metadata, write_report, AllowanceRow, Downloadable, RepositoryRule,
    RuleStore,
};

const WIDTHS: [u32; 9] = [2000, 1500, 1000, 700, 500, 350, 250, 180, 120];

const ARCHIVES: &str = r#"<archives xmlns="http://www.faustedition.net/ns">
  <archive id="gsa">
    <facsimile downloadable="yes" max-width="800"/>
  </archive>
  <archive id="bml">
    <facsimile downloadable="no"/>
  </archive>
  <archive id="dla">
    <facsimile downloadable="yes" resolution="reduced"/>
  </archive>
</archives>"#;

/// Write `{base}_{i}.jpg` fixtures with the given widths.
fn write_family(root: &Path, base: &str, widths: &[u32]) {
    for (variant, &width) in widths.iter().enumerate() {
        let path = root.join(format!("{base}_{variant}.jpg"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        // 1px tall keeps encoding cheap; only the width matters.
        image::RgbImage::new(width, 1).save(&path).unwrap();
    }
}

fn yes_rule() -> RepositoryRule {
    RepositoryRule {
        downloadable: Downloadable::Yes,
        ..RepositoryRule::default()
    }
}

#[test]
fn picks_first_variant_under_max_width() {
    let tmp = TempDir::new().unwrap();
    write_family(tmp.path(), "page", &WIDTHS);

    let rule = RepositoryRule {
        max_width: Some(800),
        ..yes_rule()
    };
    let allowance = find_allowed_facsimile(tmp.path(), "page", &rule);

    assert_eq!(allowance.download.as_deref(), Some("page_3.jpg"));
    assert_eq!(allowance.variant, Some(3));
    assert_eq!(allowance.width, Some(700));
    // No embedded metadata, so the master calibrates at the 300 dpi default
    // and variants scale with width: 300 * 700 / 2000.
    assert_eq!(allowance.dpi, Some(105));
    assert_eq!(allowance.reason, "max-width:800");
}

#[test]
fn unconstrained_rule_takes_the_master() {
    let tmp = TempDir::new().unwrap();
    write_family(tmp.path(), "page", &WIDTHS);

    let allowance = find_allowed_facsimile(tmp.path(), "page", &yes_rule());
    assert_eq!(allowance.variant, Some(0));
    assert_eq!(allowance.width, Some(2000));
    assert_eq!(allowance.dpi, Some(300));
    assert_eq!(allowance.reason, "");
}

#[test]
fn forbidden_archive_never_touches_the_filesystem() {
    let tmp = TempDir::new().unwrap();
    // No fixtures at all.
    let rule = RepositoryRule {
        downloadable: Downloadable::No,
        ..RepositoryRule::default()
    };
    let allowance = find_allowed_facsimile(tmp.path(), "page", &rule);
    assert!(!allowance.is_allowed());
    assert_eq!(allowance.reason, "no-download");
}

#[test]
fn reduced_policy_forces_variant_two() {
    let tmp = TempDir::new().unwrap();
    // Works without fixtures too: the override is not a discovered result.
    let rule = RepositoryRule {
        resolution: Some("reduced".to_string()),
        ..yes_rule()
    };
    let allowance = find_allowed_facsimile(tmp.path(), "page", &rule);
    assert_eq!(allowance.download.as_deref(), Some("page_2.jpg"));
    assert_eq!(allowance.variant, Some(2));
    assert_eq!(allowance.reason, "");
}

#[test]
fn missing_master_reports_not_found() {
    let tmp = TempDir::new().unwrap();
    let allowance = find_allowed_facsimile(tmp.path(), "page", &yes_rule());
    assert!(!allowance.is_allowed());
    assert_eq!(allowance.reason, "not-found");
}

#[test]
fn incomplete_family_reports_not_found() {
    let tmp = TempDir::new().unwrap();
    write_family(tmp.path(), "page", &WIDTHS[..4]);

    let rule = RepositoryRule {
        max_width: Some(100),
        ..yes_rule()
    };
    let allowance = find_allowed_facsimile(tmp.path(), "page", &rule);
    assert_eq!(allowance.reason, "not-found");
}

#[test]
fn repeated_resolution_is_identical() {
    let tmp = TempDir::new().unwrap();
    write_family(tmp.path(), "page", &WIDTHS);

    let rule = RepositoryRule {
        max_width: Some(800),
        ..yes_rule()
    };
    let first = find_allowed_facsimile(tmp.path(), "page", &rule);
    let second = find_allowed_facsimile(tmp.path(), "page", &rule);
    assert_eq!(first, second);
}

#[test]
fn full_batch_to_csv() {
    let tmp = TempDir::new().unwrap();
    write_family(tmp.path(), "gsa/391098/391098_0001", &WIDTHS);

    let rules = RuleStore::from_archives_xml(ARCHIVES).unwrap();
    let pages = metadata::parse_pages(
        r#"{
          "metadata": [
            {
              "sigil": "2 H",
              "sigils": {"repository": "gsa"},
              "base": "faust/gsa/391098",
              "page": [{"doc": [{"img": ["gsa/391098/391098_0001"]}]}]
            },
            {
              "sigil": "BmL 1",
              "sigils": {"repository": "bml"},
              "base": "faust/bml/1",
              "page": [{"doc": [{"img": ["bml/1/1_0001"]}]}]
            }
          ]
        }"#,
    )
    .unwrap();

    let rows: Vec<AllowanceRow> = pages
        .iter()
        .map(|page| {
            let rule = rules.get(&page.repo);
            AllowanceRow::new(page, find_allowed_facsimile(tmp.path(), &page.img, &rule))
        })
        .collect();

    let mut buf = Vec::new();
    write_report(&mut buf, &rows).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "repo,sigil,base,page,img,download,variant,reason,width,dpi"
    );
    assert_eq!(
        lines[1],
        "gsa,2 H,gsa/391098,1,gsa/391098/391098_0001,\
         gsa/391098/391098_0001_3.jpg,3,max-width:800,700,105"
    );
    assert_eq!(lines[2], "bml,BmL 1,bml/1,1,bml/1/1_0001,,,no-download,,");
}

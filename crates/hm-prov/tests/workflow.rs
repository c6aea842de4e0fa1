//! End-to-end proofing workflow against a real directory tree.

use camino::Utf8Path;
use hm_prov::{
    ProofError, ProofLabels, RegistryStore, Vault, VaultConfig, VerifyStatus, REGISTRY_VERSION,
};
use proptest::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn vault_in(dir: &Path) -> Vault {
    Vault::open(VaultConfig {
        base_dir: dir.join("system"),
        root: dir.to_path_buf(),
        ..VaultConfig::default()
    })
}

#[test]
fn alfa_clinic_scenario() {
    let dir = TempDir::new().unwrap();
    let vault = vault_in(dir.path());
    let page = dir.path().join("alfa-clinic-bold.html");
    fs::write(&page, "<!doctype html><title>Alfa Clinic</title>\n").unwrap();

    let outcome = vault
        .protect(&page, &ProofLabels::project("Alfa Clinic"))
        .unwrap();

    let registry = vault.registry().unwrap();
    assert_eq!(registry.len(), 1);
    let entry = registry
        .latest(Utf8Path::new("alfa-clinic-bold.html"))
        .unwrap();
    assert_eq!(entry.content_hash.len(), 64);
    assert!(entry.content_hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(entry.project_label.as_deref(), Some("Alfa Clinic"));

    assert_eq!(vault.verify(&page).unwrap().status, VerifyStatus::Match);

    OpenOptions::new()
        .append(true)
        .open(&page)
        .unwrap()
        .write_all(b"x")
        .unwrap();

    let check = vault.verify(&page).unwrap();
    assert_eq!(check.status, VerifyStatus::Mismatch);
    assert_eq!(
        check.expected_hash.as_deref(),
        Some(outcome.record.content_hash.as_str())
    );
    assert_ne!(check.actual_hash, outcome.record.content_hash);
}

#[test]
fn registry_document_shape() {
    let dir = TempDir::new().unwrap();
    let vault = vault_in(dir.path());
    let page = dir.path().join("portfolio").join("beauty.html");
    fs::create_dir_all(page.parent().unwrap()).unwrap();
    fs::write(&page, "beauty").unwrap();
    vault.protect(&page, &ProofLabels::default()).unwrap();

    let raw = fs::read_to_string(vault.config().registry_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["version"], REGISTRY_VERSION);
    let history = json["entries"]["portfolio/beauty.html"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0]["contentHash"].is_string());
    assert!(history[0]["createdAt"].is_string());
    assert!(history[0].get("projectLabel").is_none());
}

#[test]
fn load_save_round_trip_preserves_every_field() {
    let dir = TempDir::new().unwrap();
    let vault = vault_in(dir.path());
    for (name, project, client) in [
        ("a.html", Some("Alfa"), None),
        ("b.html", None, Some("Client")),
        ("c.html", None, None),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, name).unwrap();
        let labels = ProofLabels {
            project: project.map(str::to_string),
            client: client.map(str::to_string),
            description: None,
        };
        vault.protect(&path, &labels).unwrap();
    }

    let loaded = vault.registry().unwrap();
    let copy = RegistryStore::new(dir.path().join("copy.json"));
    copy.save(&loaded).unwrap();
    assert_eq!(copy.load().unwrap(), loaded);
}

#[test]
fn missing_registry_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn corrupt_registry_is_never_reset() {
    let dir = TempDir::new().unwrap();
    let vault = vault_in(dir.path());
    fs::create_dir_all(dir.path().join("system")).unwrap();
    fs::write(vault.config().registry_path(), "[1, 2").unwrap();
    let page = dir.path().join("page.html");
    fs::write(&page, "page").unwrap();

    assert!(matches!(
        vault.verify(&page),
        Err(ProofError::CorruptRegistry { .. })
    ));
    assert!(matches!(
        vault.protect(&page, &ProofLabels::default()),
        Err(ProofError::CorruptRegistry { .. })
    ));
    assert!(matches!(
        vault.report(),
        Err(ProofError::CorruptRegistry { .. })
    ));
    assert_eq!(
        fs::read_to_string(vault.config().registry_path()).unwrap(),
        "[1, 2"
    );
}

#[test]
fn batch_then_report() {
    let dir = TempDir::new().unwrap();
    let vault = vault_in(dir.path());
    let site = dir.path().join("site");
    for rel in ["medicine/alfa.html", "beauty/salon.html", ".git/hooks/x.html"] {
        let path = site.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel).unwrap();
    }

    let batch = vault
        .protect_dir(&site, &ProofLabels::project("Portfolio"))
        .unwrap();
    assert_eq!(batch.protected.len(), 2);
    assert_eq!(batch.skipped.len(), 1);

    let report = vault.report().unwrap();
    assert_eq!(report.lines.len(), 2);
    let text = report.to_string();
    assert!(text.contains("site/medicine/alfa.html"));
    assert!(text.contains("Project: Portfolio"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn identical_bytes_give_identical_hashes(
        body in proptest::collection::vec(any::<u8>(), 0..512),
        label in proptest::option::of("[a-zA-Z ]{1,12}"),
    ) {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(dir.path());
        let a = dir.path().join("one.html");
        let b = dir.path().join("nested").join("two.html");
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, &body).unwrap();
        fs::write(&b, &body).unwrap();

        let first = vault.protect(&a, &ProofLabels::default()).unwrap();
        let second = vault
            .protect(&b, &ProofLabels { project: label, ..ProofLabels::default() })
            .unwrap();
        prop_assert_eq!(&first.record.content_hash, &second.record.content_hash);
        prop_assert_eq!(vault.verify(&a).unwrap().status, VerifyStatus::Match);
        prop_assert_eq!(vault.verify(&b).unwrap().status, VerifyStatus::Match);
    }
}

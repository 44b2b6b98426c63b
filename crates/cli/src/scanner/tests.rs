use pretty_assertions::assert_eq;

use super::*;
use crate::components::{BASE, DOCKER, GIT, MAVEN, PROJECT};

fn scanner() -> MarkerScanner {
	MarkerScanner::new(&Catalog::new([&BASE, &PROJECT, &GIT, &MAVEN, &DOCKER]).unwrap())
}

#[test]
fn markers_declare_local_components_in_order() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
	std::fs::create_dir(dir.path().join(".git")).unwrap();
	std::fs::write(dir.path().join(PROPERTIES_FILE), "").unwrap();

	assert_eq!(scanner().scan_local(dir.path()), vec!["project", "docker", "git"]);
}

#[test]
fn bare_directory_declares_nothing() {
	let dir = tempfile::tempdir().unwrap();
	assert!(scanner().scan_local(dir.path()).is_empty());
}

#[test]
fn markers_of_unknown_components_are_ignored() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
	let scanner = MarkerScanner::new(&Catalog::new([&PROJECT]).unwrap());
	assert!(scanner.scan_local(dir.path()).is_empty());
}

#[test]
fn classpath_fingerprint_names_binary_and_components() {
	let dir = tempfile::tempdir().unwrap();
	let classpath = scanner().classpath(dir.path());
	assert_eq!(classpath[0], format!("anvil-cli@{}", env!("CARGO_PKG_VERSION")));
	assert_eq!(&classpath[1..], ["base", "project", "git", "maven", "docker"]);
	assert_eq!(scanner().scan_classpath(dir.path(), &classpath), vec!["base", "project", "git", "maven", "docker"]);
}

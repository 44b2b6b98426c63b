mod support;

use std::sync::Arc;

use anvil_invocation::ActionLog;
use anvil_runbase::{LifecycleState, RunbaseError, Settings};
use pretty_assertions::assert_eq;
use support::*;

#[test]
fn child_runbases_are_created_once_and_initialized() {
	let root = tempfile::tempdir().unwrap();
	write_properties(root.path(), "shared = \"root\"\n_private = \"root only\"");
	write_properties(&root.path().join("lib"), "own = \"lib\"");
	let session = session(Settings::default(), &["project"]);
	let parent = init(&session, root.path(), &ActionLog::new());

	let child = parent.child("lib").unwrap();
	let again = parent.child("./lib/../lib").unwrap();
	assert!(Arc::ptr_eq(&child, &again));
	assert!(Arc::ptr_eq(&child, &session.runbase(&root.path().join("lib")).unwrap()));

	assert!(child.is_initialized());
	assert_eq!(child.state_of(PROJECT.key()), LifecycleState::PostInitialized);
	assert_eq!(child.properties().get("own").as_deref(), Some("lib"));
	assert_eq!(child.properties().get("shared").as_deref(), Some("root"));
	assert!(!child.properties().contains("private"));
	assert_eq!(parent.properties().get("private").as_deref(), Some("root only"));
}

#[test]
fn child_instances_are_independent_of_the_parent() {
	let root = tempfile::tempdir().unwrap();
	write_properties(&root.path().join("app"), "\"@project.version\" = \"2.0\"");
	let session = session(Settings::default(), &["project"]);
	let parent = init(&session, root.path(), &ActionLog::new());
	let child = parent.child("app").unwrap();

	let parent_project = parent.load_as::<Project>().unwrap();
	let child_project = child.load_as::<Project>().unwrap();
	assert!(!parent_project.ptr_eq(&child_project));
	assert_eq!(child_project.read().version, "2.0");
	assert_eq!(parent_project.read().version, "");
}

#[test]
fn child_failure_is_not_cached() {
	let root = tempfile::tempdir().unwrap();
	write_properties(&root.path().join("bad"), "anvil.default.component = \"nothing\"");
	let session = session(Settings::default(), &["project"]);
	let parent = init(&session, root.path(), &ActionLog::new());

	assert!(parent.child("bad").is_err());
	assert!(session.runbases().get(&root.path().join("bad")).is_none());
}

#[test]
fn root_is_shared_with_children_resolving_to_it() {
	let root = tempfile::tempdir().unwrap();
	std::fs::create_dir(root.path().join("lib")).unwrap();
	let session = session(Settings::default(), &["project"]);
	let parent = init(&session, root.path(), &ActionLog::new());

	assert!(Arc::ptr_eq(&parent, &parent.child(".").unwrap()));
	let lib = parent.child("lib").unwrap();
	assert!(Arc::ptr_eq(&parent, &lib.child("..").unwrap()));
	assert!(parent.load_as::<Project>().unwrap().ptr_eq(&lib.child("..").unwrap().load_as::<Project>().unwrap()));
}

#[test]
fn declared_child_bases_are_loaded_in_order() {
	let root = tempfile::tempdir().unwrap();
	write_properties(root.path(), "_anvil.child.bases = \"app, ., lib/../lib,\"");
	write_properties(&root.path().join("app"), "\"@project.version\" = \"2.0\"");
	write_properties(&root.path().join("lib"), "\"@project.version\" = \"3.0\"");
	let session = session(Settings::default(), &["project"]);
	let parent = init(&session, root.path(), &ActionLog::new());

	assert_eq!(parent.child_bases(), [root.path().join("app"), root.path().join("lib")]);
	let children = parent.children().unwrap();
	assert!(Arc::ptr_eq(&children[1], &parent.child("lib").unwrap()));
	assert!(children.iter().all(|child| child.child_bases().is_empty()));

	let versions: Vec<String> =
		parent.load_children::<Project>().unwrap().iter().map(|project| project.read().version.clone()).collect();
	assert_eq!(versions, vec!["2.0", "3.0"]);
	assert_eq!(parent.find_children::<Project>().unwrap().len(), 2);
	assert!(parent.find_children::<Git>().unwrap().is_empty());
	assert_eq!(children[0].state_of(GIT.key()), LifecycleState::Uncreated);
}

#[test]
fn missing_child_base_is_an_error() {
	let root = tempfile::tempdir().unwrap();
	write_properties(root.path(), "anvil.child.bases = \"ghost\"");
	let session = session(Settings::default(), &["project"]);
	let parent = init(&session, root.path(), &ActionLog::new());

	let err = parent.children().unwrap_err();
	assert!(matches!(err, RunbaseError::MissingChildBase { .. }));
	assert!(parent.load_children::<Project>().is_err());
}

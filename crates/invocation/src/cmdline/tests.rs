use anvil_registry::{Catalog, DescriptionCache, RegistryError};
use pretty_assertions::assert_eq;

use super::*;
use crate::fixtures::{GIT, PROJECT};

fn parse(default: Option<ComponentKey>, tokens: &[&str]) -> Result<ActionLog, ParseError> {
	let catalog = Catalog::new([&PROJECT, &GIT]).expect("valid catalog");
	let descriptions = DescriptionCache::new();
	CmdLineParser::new(&catalog, &descriptions).with_default(default).parse(tokens)
}

fn rendered(log: &ActionLog) -> Vec<String> {
	log.iter().map(|a| a.to_string()).collect()
}

#[test]
fn tokens_target_default_component() {
	let log = parse(Some(PROJECT.key()), &["version=1.2", "pack"]).expect("parses");
	assert_eq!(
		rendered(&log),
		vec!["project.init()", "project.version=1.2  [from cmdline]", "project.pack()"]
	);
	assert!(log.iter().all(|a| a.source == ActionSource::CommandLine));
}

#[test]
fn component_token_switches_target() {
	let log = parse(Some(PROJECT.key()), &["clean", "git:", "tag_prefix=rel-", "tag", "project:", "pack"]).expect("parses");
	assert_eq!(
		rendered(&log),
		vec![
			"project.init()",
			"project.clean()",
			"git.init()",
			"git.tag_prefix=rel-  [from cmdline]",
			"git.tag()",
			"project.pack()",
		]
	);
	assert_eq!(log.to_cmd_line_run(), "project: clean pack git: tag");
}

#[test]
fn type_name_is_accepted_as_target() {
	let log = parse(None, &["Git:", "tag"]).expect("parses");
	assert_eq!(log.involved_components(), vec![GIT.key()]);
}

#[test]
fn bare_component_token_only_instantiates() {
	let log = parse(None, &["git:"]).expect("parses");
	assert_eq!(rendered(&log), vec!["git.init()"]);
}

#[test]
fn bare_boolean_attribute_is_switched_on() {
	let log = parse(Some(PROJECT.key()), &["skip_tests"]).expect("parses");
	assert_eq!(log.find_set_attributes(PROJECT.key())[0].value.as_deref(), Some("true"));
}

#[test]
fn multi_value_entries_are_accepted() {
	let log = parse(Some(PROJECT.key()), &["repos.central=https://repo.example"]).expect("parses");
	assert_eq!(log.find_set_attributes(PROJECT.key())[0].member(), "repos.central");
}

#[test]
fn repeated_assignment_keeps_last_value() {
	let log = parse(Some(PROJECT.key()), &["version=1", "pack", "version=2"]).expect("parses");
	assert_eq!(log.len(), 3);
	assert_eq!(log.actions()[1].value.as_deref(), Some("2"));
}

#[test]
fn unknown_component_suggests_closest_name() {
	let err = parse(None, &["gti:"]).unwrap_err();
	match err {
		ParseError::Component(RegistryError::UnknownComponent { name, suggestion, .. }) => {
			assert_eq!(name, "gti");
			assert_eq!(suggestion, Some("git"));
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn unknown_member_is_rejected() {
	let err = parse(Some(PROJECT.key()), &["pakc"]).unwrap_err();
	assert_eq!(
		err,
		ParseError::UnknownMember { component: "project", member: "pakc".into(), suggestion: Some("pack".into()) }
	);
	assert_eq!(err.to_string(), "component 'project' has no attribute or operation 'pakc' (did you mean 'pack'?)");
}

#[test]
fn non_boolean_attribute_needs_a_value() {
	let err = parse(Some(PROJECT.key()), &["version"]).unwrap_err();
	assert!(matches!(err, ParseError::UnknownMember { ref member, .. } if member == "version"));
}

#[test]
fn unknown_attribute_assignment_is_rejected() {
	let err = parse(Some(GIT.key()), &["nope=1"]).unwrap_err();
	assert!(matches!(err, ParseError::UnknownMember { component: "git", .. }));
}

#[test]
fn tokens_without_target_need_default() {
	let err = parse(None, &["pack"]).unwrap_err();
	assert_eq!(err, ParseError::NoDefaultComponent { token: "pack".into() });
}

#[test]
fn empty_input_is_an_empty_log() {
	assert!(parse(None, &[]).expect("parses").is_empty());
}

mod support;

use anvil_invocation::{ActionLog, ActionSource};
use anvil_runbase::{RunbaseError, Settings};
use pretty_assertions::assert_eq;
use support::*;

/// Effective project version and its source, with the given property file
/// and command-line value.
fn version_with(properties: &str, cmdline: Option<&str>) -> (String, Option<ActionSource>) {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), properties);
	let session = session(Settings::default(), &["project"]);
	let log: ActionLog = cmdline.map(|value| set(PROJECT.key(), "version", value)).into_iter().collect();
	let runbase = init(&session, dir.path(), &log);

	let version = runbase.load_as::<Project>().unwrap().read().version.clone();
	let effective = runbase.effective_actions();
	let source = effective.find_set_attributes(PROJECT.key()).into_iter().find(|a| a.member() == "version").and_then(
		|action| action.value.is_some().then_some(action.source),
	);
	(version, source)
}

#[test]
fn command_line_beats_properties_beat_defaults() {
	let all = "project.version.default = \"1.0\"\n\"@project.version\" = \"2.0\"";
	assert_eq!(version_with(all, Some("3.0")), ("3.0".to_string(), Some(ActionSource::CommandLine)));
	assert_eq!(version_with(all, None), ("2.0".to_string(), Some(ActionSource::Properties)));
	assert_eq!(
		version_with("project.version.default = \"1.0\"", None),
		("1.0".to_string(), Some(ActionSource::Defaults))
	);
	assert_eq!(version_with("", None), (String::new(), None));
}

#[test]
fn bound_property_defaults_are_interpolated() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), "cores = \"8\"\nanvil.jobs = \"${cores}\"");
	let session = session(Settings::default(), &[]);
	let runbase = init(&session, dir.path(), &ActionLog::from_iter([instantiate(BASE.key())]));

	assert_eq!(runbase.load_as::<Base>().unwrap().read().jobs, 8);
}

#[test]
fn empty_component_name_addresses_the_default_component() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), "\"@.version\" = \"5.0\"\n\"@Git.tag_prefix\" = \"release-\"");
	let session = session(Settings::default(), &["project"]);
	let runbase = init(&session, dir.path(), &ActionLog::from_iter([instantiate(GIT.key())]));

	assert_eq!(runbase.load_as::<Project>().unwrap().read().version, "5.0");
	assert_eq!(runbase.load_as::<Git>().unwrap().read().tag_prefix, "release-");
}

#[test]
fn default_component_can_be_named_in_properties() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), "anvil.default.component = \"git\"\n\"@.tag_prefix\" = \"r\"");
	let session = session(Settings::default(), &[]);
	let runbase = init(&session, dir.path(), &ActionLog::new());

	assert_eq!(runbase.discovery().default_component(), Some(GIT.key()));
	assert_eq!(names(&runbase.activation_order()), vec!["git"]);
	assert_eq!(runbase.load_as::<Git>().unwrap().read().tag_prefix, "r");
}

#[test]
fn missing_named_default_is_fatal() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), "anvil.default.component = \"kubernetes\"");
	let session = session(Settings::default(), &[]);

	let err = session.open(dir.path()).unwrap_err();
	assert!(matches!(err, RunbaseError::MissingDefault { ref name, .. } if name == "kubernetes"));
}

#[test]
fn multi_value_entries_from_properties_and_command_line() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(
		dir.path(),
		"\"@docker.jvm_agents.otel.coordinates\" = \"io.otel:agent\"\n\"@project.repos.10\" = \"https://ten\"\n\"@project.repos.2\" = \"https://two\"",
	);
	let session = session(Settings::default(), &["project"]);
	let log = ActionLog::from_iter([
		instantiate(DOCKER.key()),
		set(DOCKER.key(), "jvm_agents.otel.options", "-Dtrace=on"),
		set(DOCKER.key(), "image", "custom:1"),
	]);
	let runbase = init(&session, dir.path(), &log);

	let docker = runbase.load_as::<Docker>().unwrap();
	assert_eq!(
		docker.read().jvm_agents.get("otel"),
		Some(Agent { coordinates: "io.otel:agent".to_string(), options: "-Dtrace=on".to_string() })
	);
	assert_eq!(docker.read().image, "custom:1");
	assert_eq!(runbase.load_as::<Project>().unwrap().read().repos.keys(), vec!["2".to_string(), "10".to_string()]);
}

#[test]
fn property_naming_no_attribute_is_fatal() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), "\"@project.nope\" = \"x\"");
	let session = session(Settings::default(), &["project"]);
	let runbase = session.open(dir.path()).unwrap();

	let err = runbase.init(&ActionLog::new()).unwrap_err();
	assert_eq!(err.to_string(), "property 'nope' does not address an attribute of component 'project'");
}

#[test]
fn invalid_values_name_their_origin() {
	let dir = tempfile::tempdir().unwrap();
	write_properties(dir.path(), "\"@base.jobs\" = \"many\"");
	let session = session(Settings::default(), &[]);
	let runbase = session.open(dir.path()).unwrap();

	let err = runbase.init(&ActionLog::from_iter([instantiate(BASE.key())])).unwrap_err();
	assert!(matches!(err, RunbaseError::Assign { component: "base", origin: ActionSource::Properties, .. }));
	assert!(err.to_string().starts_with("cannot configure base.jobs from properties: "));
}

#[test]
fn effective_table_masks_secrets_and_hides_nulls() {
	let dir = tempfile::tempdir().unwrap();
	let session = session(Settings::default(), &["project"]);
	let log = ActionLog::from_iter([
		set(PROJECT.key(), "publish_password", "hunter2"),
		set(PROJECT.key(), "version", "1.0"),
	]);
	let runbase = init(&session, dir.path(), &log);

	let table = runbase.effective_actions().to_column_text(false).render();
	assert!(table.contains("publish_password=***"));
	assert!(!table.contains("hunter2"));
	assert!(table.contains("version=1.0"));
	assert!(!table.contains("skip_tests"));

	let verbose = runbase.effective_actions().to_column_text(true).render();
	assert!(verbose.contains("skip_tests=null"));
}

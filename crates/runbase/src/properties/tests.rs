use std::fs;

use pretty_assertions::assert_eq;

use super::*;

fn write(dir: &Path, text: &str) {
	fs::write(dir.join(PROPERTIES_FILE), text).expect("write property file");
}

fn sources() -> PropertySources {
	PropertySources::default()
}

#[test]
fn toml_tables_flatten_to_dotted_keys() {
	let layer = Layer::from_toml(
		"test",
		r#"
			"@project.version" = "1.0"
			jobs = 4
			fast = true
			modules = ["core", "cli"]

			[docker]
			image = "alpine"
			ports.http = 8080
		"#,
		true,
	)
	.expect("valid toml");

	assert_eq!(layer.get("@project.version"), Some("1.0"));
	assert_eq!(layer.get("jobs"), Some("4"));
	assert_eq!(layer.get("fast"), Some("true"));
	assert_eq!(layer.get("modules"), Some("core,cli"));
	assert_eq!(layer.get("docker.image"), Some("alpine"));
	assert_eq!(layer.get("docker.ports.http"), Some("8080"));
}

#[test]
fn underscore_keys_apply_only_to_own_layer() {
	let text = "_local = \"mine\"\nshared = \"all\"";
	let own = Layer::from_toml("own", text, true).expect("valid toml");
	let inherited = Layer::from_toml("parent", text, false).expect("valid toml");

	assert_eq!(own.get("local"), Some("mine"));
	assert_eq!(own.get("_local"), None);
	assert_eq!(inherited.get("local"), None);
	assert_eq!(inherited.get("shared"), Some("all"));
}

#[test]
fn environment_is_exposed_under_both_names() {
	let layer = Layer::environment([("MY_TOOL_HOME".to_string(), "/opt/tool".to_string())]);
	assert_eq!(layer.get("MY_TOOL_HOME"), Some("/opt/tool"));
	assert_eq!(layer.get("my.tool.home"), Some("/opt/tool"));
}

#[test]
fn first_layer_wins() {
	let properties = Properties::new(vec![
		Layer::new("high", [("a", "1")]),
		Layer::new("low", [("a", "2"), ("b", "3")]),
	]);
	assert_eq!(properties.get("a").as_deref(), Some("1"));
	assert_eq!(properties.get("b").as_deref(), Some("3"));
	assert_eq!(properties.source_of("b"), Some("low"));
	assert_eq!(properties.get("c"), None);

	let overridden = properties.with_override("b", "4");
	assert_eq!(overridden.get("b").as_deref(), Some("4"));
	assert_eq!(properties.get("b").as_deref(), Some("3"));
}

#[test]
fn interpolation_resolves_across_layers() {
	let properties = Properties::new(vec![
		Layer::new("high", [("greeting", "hello ${name}"), ("name", "${first} ${last}")]),
		Layer::new("low", [("first", "Ada"), ("last", "Lovelace")]),
	]);
	assert_eq!(properties.get("greeting").as_deref(), Some("hello Ada Lovelace"));
	assert_eq!(properties.get_raw("greeting"), Some("hello ${name}"));
}

#[test]
fn unresolved_interpolation_stays_literal() {
	let properties = Properties::new(vec![Layer::new(
		"test",
		[("a", "x ${missing} y"), ("loop", "${loop}"), ("open", "${unterminated")],
	)]);
	assert_eq!(properties.get("a").as_deref(), Some("x ${missing} y"));
	assert_eq!(properties.get("loop").as_deref(), Some("${loop}"));
	assert_eq!(properties.get("open").as_deref(), Some("${unterminated"));
}

#[test]
fn component_keys_are_classified() {
	let properties = Properties::new(vec![Layer::new(
		"test",
		[
			("@git", ""),
			("@docker", " off "),
			("@project.version", "1.2"),
			("@project.repos.central", "https://repo"),
			("@.skip_tests", "true"),
			("other", "x"),
		],
	)]);

	assert_eq!(
		properties.component_switches(),
		vec![("docker".to_string(), false), ("git".to_string(), true)]
	);
	let assignments: Vec<(String, String, String)> = properties
		.component_assignments()
		.into_iter()
		.map(|p| (p.component, p.path, p.value))
		.collect();
	assert_eq!(
		assignments,
		vec![
			(String::new(), "skip_tests".to_string(), "true".to_string()),
			("project".to_string(), "repos.central".to_string(), "https://repo".to_string()),
			("project".to_string(), "version".to_string(), "1.2".to_string()),
		]
	);
}

#[test]
fn load_walks_ancestors_while_files_exist() {
	let root = tempfile::tempdir().expect("tempdir");
	let top = root.path().join("top");
	let middle = top.join("middle");
	let base = middle.join("base");
	fs::create_dir_all(&base).expect("create dirs");

	write(&top, "from.top = \"top\"\nlevel = \"top\"");
	write(&middle, "level = \"middle\"\n_private = \"middle only\"");
	write(&base, "level = \"base\"\n_private = \"base only\"");

	let properties = Properties::load(&base, &sources()).expect("loads");
	assert_eq!(properties.get("level").as_deref(), Some("base"));
	assert_eq!(properties.get("from.top").as_deref(), Some("top"));
	assert_eq!(properties.get("private").as_deref(), Some("base only"));

	let middle_props = Properties::load(&middle, &sources()).expect("loads");
	assert_eq!(middle_props.get("private").as_deref(), Some("middle only"));
}

#[test]
fn load_stops_at_first_directory_without_file() {
	let root = tempfile::tempdir().expect("tempdir");
	let gap = root.path().join("gap");
	let base = gap.join("base");
	fs::create_dir_all(&base).expect("create dirs");

	write(root.path(), "unreachable = \"yes\"");
	write(&base, "own = \"yes\"");

	let properties = Properties::load(&base, &sources()).expect("loads");
	assert_eq!(properties.get("own").as_deref(), Some("yes"));
	assert!(!properties.contains("unreachable"));
}

#[test]
fn layer_priority_on_load() {
	let root = tempfile::tempdir().expect("tempdir");
	let global = root.path().join("global.toml");
	fs::write(&global, "key = \"global\"\nonly.global = \"g\"\n_hidden = \"h\"").expect("write global");
	write(root.path(), "key = \"file\"");

	let mut sources = PropertySources {
		global_file: Some(global),
		..PropertySources::default()
	};
	let properties = Properties::load(root.path(), &sources).expect("loads");
	assert_eq!(properties.get("key").as_deref(), Some("file"));
	assert_eq!(properties.get("only.global").as_deref(), Some("g"));
	assert!(!properties.contains("hidden"));

	sources.environment = vec![("KEY".to_string(), "env".to_string())];
	let properties = Properties::load(root.path(), &sources).expect("loads");
	assert_eq!(properties.get("key").as_deref(), Some("env"));

	sources.overrides.insert("key".to_string(), "override".to_string());
	let properties = Properties::load(root.path(), &sources).expect("loads");
	assert_eq!(properties.get("key").as_deref(), Some("override"));
}

#[test]
fn invalid_file_reports_path() {
	let root = tempfile::tempdir().expect("tempdir");
	write(root.path(), "not = [valid");
	let err = Properties::load(root.path(), &sources()).unwrap_err();
	assert!(matches!(err, RunbaseError::PropertyFile { ref path, .. } if path.ends_with(PROPERTIES_FILE)));
}

#[test]
fn column_text_masks_secrets_and_skips_environment() {
	let properties = Properties::new(vec![
		Layer::environment([("HOME".to_string(), "/home/me".to_string())]),
		Layer::new("anvil.toml", [("repo.password", "hunter2"), ("repo.url", "https://repo")]),
	]);
	let rendered = properties.to_column_text().render();
	assert_eq!(
		rendered,
		"repo.password  ***           anvil.toml\n\
		 repo.url       https://repo  anvil.toml\n"
	);
}

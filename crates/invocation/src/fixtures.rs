use anvil_primitives::MultiValueMap;
use anvil_registry::{Scope, attribute, component, multi_value, operation};

#[derive(Debug, Default)]
pub struct Project {
	pub version: String,
	pub skip_tests: bool,
	pub publish_password: String,
	pub repos: MultiValueMap<String>,
}

impl Project {
	fn pack(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		Ok(())
	}

	fn clean(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		Ok(())
	}
}

component! {
	pub static PROJECT: Project = {
		name: "project",
		description: "Project under build.",
		create: |_| Project::default(),
		attributes: [
			attribute!(Project, version: String, "Version."),
			attribute!(Project, skip_tests: bool, "Skip tests."),
			attribute!(Project, publish_password: String, "Repository password."),
			multi_value!(Project, repos: String, "Repository urls by name."),
		],
		operations: [
			operation!(Project, pack, "Creates the artifacts."),
			operation!(Project, clean, "Deletes outputs."),
		],
	}
}

#[derive(Debug, Default)]
pub struct Git {
	pub tag_prefix: String,
}

impl Git {
	fn tag(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		Ok(())
	}
}

component! {
	pub static GIT: Git = {
		name: "git",
		description: "Git helpers.",
		create: |_| Git::default(),
		attributes: [attribute!(Git, tag_prefix: String, "Tag prefix.")],
		operations: [operation!(Git, tag, "Tags the head commit.")],
	}
}

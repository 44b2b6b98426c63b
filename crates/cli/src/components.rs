//! Components shipped with the binary.
//!
//! `project` describes the artifact under build; `git`, `maven` and `docker`
//! contribute to it through initializers, and `base` holds settings shared by
//! all of them.

use std::path::{Path, PathBuf};

use anvil_primitives::{ColumnText, MultiValueMap, mask_if_sensitive};
use anvil_registry::{
	ComponentKey, Handle, Requirement, Scope, StructDef, attribute, component, inject, multi_value, operation, post_init,
	pre_init, register_component,
};
use anvil_runbase::discovery::WORK_DIR;
use anyhow::{Context, bail};

/// Directory receiving the files written by operations.
pub fn output_dir(base_dir: &Path) -> PathBuf {
	base_dir.join(WORK_DIR).join("output")
}

fn write_output(scope: &dyn Scope, file: &str, contents: &str) -> anyhow::Result<PathBuf> {
	let dir = output_dir(scope.base_dir());
	std::fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
	let path = dir.join(file);
	std::fs::write(&path, contents).with_context(|| format!("cannot write {}", path.display()))?;
	tracing::info!(path = %path.display(), "wrote output");
	Ok(path)
}

#[derive(Debug)]
pub struct Base {
	pub jobs: u32,
	pub offline: bool,
}

impl Base {
	fn info(&mut self, scope: &dyn Scope) -> anyhow::Result<()> {
		println!("base dir: {}", scope.base_dir().display());
		println!("jobs:     {}", self.jobs);
		println!("offline:  {}", self.offline);
		Ok(())
	}
}

fn available_jobs() -> u32 {
	std::thread::available_parallelism().map_or(1, |n| u32::try_from(n.get()).unwrap_or(u32::MAX))
}

component! {
	pub static BASE: Base = {
		name: "base",
		description: "Settings shared by every build component.",
		create: |_| Base { jobs: available_jobs(), offline: false },
		attributes: [
			attribute!(Base, jobs: u32, "Parallel jobs.").bind("anvil.jobs"),
			attribute!(Base, offline: bool, "Never reach the network.").bind("anvil.offline"),
		],
		operations: [operation!(Base, info, "Prints the base directory and shared settings.")],
	}
}

#[derive(Debug, Default)]
pub struct Project {
	pub name: String,
	pub version: String,
	pub skip_tests: bool,
	pub repos: MultiValueMap<String>,
	pub publish_password: String,
}

impl Project {
	pub fn artifact(&self) -> String {
		format!("{}-{}", self.name, self.version)
	}

	fn info(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		let mut table = ColumnText::new().column(8, 20).column(0, 80);
		table.add_row(["name", self.name.as_str()]);
		table.add_row(["version", self.version.as_str()]);
		table.add_row(["password", mask_if_sensitive("publish_password", &self.publish_password)]);
		for (name, url) in self.repos.entries() {
			table.add_row([format!("repo {name}"), url]);
		}
		print!("{}", table.render());
		Ok(())
	}

	fn pack(&mut self, scope: &dyn Scope) -> anyhow::Result<()> {
		if self.version.is_empty() {
			bail!("project version is not set; pass version=<v> or set project.version");
		}
		let mut manifest = format!("name={}\nversion={}\n", self.name, self.version);
		for (name, url) in self.repos.entries() {
			manifest.push_str(&format!("repo.{name}={url}\n"));
		}
		let path = write_output(scope, &format!("{}.manifest", self.artifact()), &manifest)?;
		println!("packed {}", path.display());
		Ok(())
	}
}

fn directory_name(dir: &Path) -> String {
	dir.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| String::from("project"))
}

component! {
	pub static PROJECT: Project = {
		name: "project",
		description: "The project under build.\nName, version and publication repositories of the produced artifact.",
		create: |scope: &dyn Scope| Project { name: directory_name(scope.base_dir()), ..Project::default() },
		attributes: [
			attribute!(Project, name: String, "Artifact name.").bind("project.name"),
			attribute!(Project, version: String, "Artifact version.").bind("project.version"),
			attribute!(Project, skip_tests: bool, "Skip tests while building."),
			attribute!(Project, publish_password: String, "Password of the publication repository."),
			multi_value!(Project, repos: String, "Repository urls by name."),
		],
		operations: [
			operation!(Project, info, "Prints the project settings."),
			operation!(Project, pack, "Writes the artifact manifest."),
		],
	}
}

#[derive(Debug)]
pub struct Git {
	pub tag_prefix: String,
	pub branch: String,
}

impl Git {
	fn tag(&mut self, scope: &dyn Scope) -> anyhow::Result<()> {
		let project = scope.load::<Project>()?;
		let version = project.read().version.clone();
		if version.is_empty() {
			bail!("cannot tag without a project version");
		}
		println!("git tag {}{version}", self.tag_prefix);
		Ok(())
	}
}

/// Current branch named by `.git/HEAD`, empty when detached or absent.
pub fn read_branch(base_dir: &Path) -> String {
	std::fs::read_to_string(base_dir.join(".git").join("HEAD"))
		.ok()
		.and_then(|head| head.trim().strip_prefix("ref: refs/heads/").map(str::to_string))
		.unwrap_or_default()
}

component! {
	pub static GIT: Git = {
		name: "git",
		description: "Git work tree helpers.\nDerives a snapshot version from the current branch when the project has none.",
		create: |_| Git { tag_prefix: String::from("v"), branch: String::new() },
		attributes: [attribute!(Git, tag_prefix: String, "Prefix of release tags.")],
		operations: [operation!(Git, tag, "Prints the release tag of the project version.")],
		post_inits: [post_init!(Git, PROJECT: Project, |git: &mut Git, project: &mut Project| {
			if project.version.is_empty() && !git.branch.is_empty() {
				project.version = format!("0.0.0-{}-SNAPSHOT", git.branch.replace('/', "-"));
			}
			Ok(())
		})],
		init: |git: &mut Git, scope: &dyn Scope| {
			git.branch = read_branch(scope.base_dir());
			Ok(())
		},
	}
}

#[derive(Debug, Default)]
pub struct Maven {
	pub goals: Vec<String>,
}

/// Repository added to every project built with maven.
pub const CENTRAL: &str = "https://repo.maven.apache.org/maven2";

impl Maven {
	fn command(&mut self, scope: &dyn Scope) -> anyhow::Result<()> {
		let project = scope.load::<Project>()?;
		let base = scope.load::<Base>()?;
		let mut args = vec![String::from("mvn"), String::from("-B"), format!("-T{}", base.read().jobs)];
		if base.read().offline {
			args.push(String::from("-o"));
		}
		if project.read().skip_tests {
			args.push(String::from("-DskipTests"));
		}
		args.extend(self.goals.iter().cloned());
		println!("{}", args.join(" "));
		Ok(())
	}
}

component! {
	pub static MAVEN: Maven = {
		name: "maven",
		description: "Maven conventions.\nAdds Maven Central to the project repositories.",
		create: |_| Maven { goals: vec![String::from("package")] },
		attributes: [attribute!(Maven, goals: Vec<String>, "Goals to run, comma separated.")],
		operations: [operation!(Maven, command, "Prints the maven command line.")],
		requires: [Requirement::Component(&BASE)],
		pre_inits: [pre_init!(PROJECT: Project, |project: &mut Project| {
			if !project.repos.contains_key("central") {
				project.repos.put("central", CENTRAL.to_string());
			}
			Ok(())
		})],
	}
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Agent {
	pub coordinates: String,
	pub options: String,
}

pub static AGENT: StructDef = StructDef {
	type_name: "Agent",
	attributes: &[
		attribute!(Agent, coordinates: String, "Maven coordinates of the agent jar."),
		attribute!(Agent, options: String, "Options passed to the agent."),
	],
};

#[derive(Debug, Default)]
pub struct Docker {
	pub image: String,
	pub base_image: String,
	pub jvm_agents: MultiValueMap<Agent>,
	pub project: Option<Handle<Project>>,
}

impl Docker {
	/// The configured image name, or `<name>:<version>` of the project.
	pub fn image_name(&self) -> String {
		match &self.project {
			Some(project) if self.image.is_empty() => {
				let project = project.read();
				format!("{}:{}", project.name, project.version)
			}
			_ => self.image.clone(),
		}
	}

	/// Dockerfile text for the current configuration.
	pub fn render_dockerfile(&self) -> String {
		let mut text = format!("FROM {}\n", self.base_image);
		if let Some(project) = &self.project {
			text.push_str(&format!("COPY {}.manifest /app/\n", project.read().artifact()));
		}
		let agents: Vec<String> = self
			.jvm_agents
			.entries()
			.into_iter()
			.map(|(name, agent)| match agent.options.as_str() {
				"" => format!("-javaagent:/agents/{name}.jar"),
				options => format!("-javaagent:/agents/{name}.jar={options}"),
			})
			.collect();
		if !agents.is_empty() {
			text.push_str(&format!("ENV JAVA_TOOL_OPTIONS=\"{}\"\n", agents.join(" ")));
		}
		text
	}

	fn dockerfile(&mut self, scope: &dyn Scope) -> anyhow::Result<()> {
		let path = write_output(scope, "Dockerfile", &self.render_dockerfile())?;
		println!("image {} described in {}", self.image_name(), path.display());
		Ok(())
	}
}

/// Components providing the version of the image, chosen by the
/// `docker.version.source` property.
fn version_source(scope: &dyn Scope) -> Option<ComponentKey> {
	match scope.property("docker.version.source").as_deref() {
		Some("git") => Some(GIT.key()),
		_ => None,
	}
}

component! {
	pub static DOCKER: Docker = {
		name: "docker",
		description: "Container images of the project.",
		create: |_| Docker { base_image: String::from("eclipse-temurin:21-jre"), ..Docker::default() },
		attributes: [
			attribute!(Docker, image: String, "Image name; defaults to <name>:<version>."),
			attribute!(Docker, base_image: String, "Image the project image is built from."),
			multi_value!(Docker, jvm_agents: struct Agent => AGENT, "Java agents added to the image, by name."),
		],
		operations: [operation!(Docker, dockerfile, "Writes the Dockerfile.")],
		requires: [Requirement::Dynamic { name: "version_source", resolve: version_source }],
		injects: [inject!(Docker, project => PROJECT)],
		init: |docker: &mut Docker, _scope: &dyn Scope| -> anyhow::Result<()> {
			if docker.base_image.trim().is_empty() {
				bail!("base_image must not be empty");
			}
			Ok(())
		},
	}
}

register_component!(BASE, PROJECT, GIT, MAVEN, DOCKER);

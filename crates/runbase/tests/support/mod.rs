//! Components and helpers shared by the runbase integration tests.

#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::Arc;

use anvil_invocation::{Action, ActionLog, ActionSource};
use anvil_primitives::MultiValueMap;
use anvil_registry::{
	Catalog, ComponentKey, Handle, Requirement, Scope, StructDef, attribute, component, inject, multi_value, operation,
	post_init, pre_init,
};
use anvil_runbase::{PROPERTIES_FILE, Runbase, Session, Settings, StaticScanner};
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Default)]
pub struct Base {
	pub jobs: u32,
}

component! {
	pub static BASE: Base = {
		name: "base",
		description: "Shared build settings.",
		create: |_| Base { jobs: 1 },
		attributes: [attribute!(Base, jobs: u32, "Parallel jobs.").bind("anvil.jobs")],
	}
}

#[derive(Debug, Default)]
pub struct Project {
	pub version: String,
	pub skip_tests: bool,
	pub publish_password: String,
	pub repos: MultiValueMap<String>,
	pub packed: u32,
}

impl Project {
	fn pack(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		self.packed += 1;
		Ok(())
	}

	fn fail(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		anyhow::bail!("packaging exploded")
	}
}

component! {
	pub static PROJECT: Project = {
		name: "project",
		description: "Project under build.",
		create: |_| Project::default(),
		attributes: [
			attribute!(Project, version: String, "Version.").bind("project.version.default"),
			attribute!(Project, skip_tests: bool, "Skip tests."),
			attribute!(Project, publish_password: String, "Repository password."),
			multi_value!(Project, repos: String, "Repository urls by name."),
		],
		operations: [
			operation!(Project, pack, "Creates the artifacts."),
			operation!(Project, fail, "Always fails."),
		],
	}
}

#[derive(Debug, Default)]
pub struct Git {
	pub tag_prefix: String,
	pub observed: String,
	pub tagged: u32,
}

impl Git {
	fn tag(&mut self, _scope: &dyn Scope) -> anyhow::Result<()> {
		self.tagged += 1;
		Ok(())
	}
}

component! {
	pub static GIT: Git = {
		name: "git",
		description: "Git helpers.",
		create: |_| Git { tag_prefix: String::from("v"), ..Git::default() },
		attributes: [attribute!(Git, tag_prefix: String, "Prefix of release tags.")],
		operations: [operation!(Git, tag, "Tags the head commit.")],
		post_inits: [post_init!(Git, PROJECT: Project, |git: &mut Git, project: &mut Project| {
			git.observed = project.version.clone();
			if project.version.is_empty() {
				project.version = format!("{}0.0.1", git.tag_prefix);
			}
			Ok(())
		})],
	}
}

#[derive(Debug, Default)]
pub struct Maven;

component! {
	pub static MAVEN: Maven = {
		name: "maven",
		description: "Maven conventions.",
		create: |_| Maven,
		pre_inits: [pre_init!(PROJECT: Project, |project: &mut Project| {
			project.skip_tests = true;
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
		attribute!(Agent, coordinates: String, "Agent artifact."),
		attribute!(Agent, options: String, "Agent options."),
	],
};

#[derive(Debug, Default)]
pub struct Docker {
	pub image: String,
	pub jvm_agents: MultiValueMap<Agent>,
	pub project: Option<Handle<Project>>,
}

component! {
	pub static DOCKER: Docker = {
		name: "docker",
		description: "Container images.",
		create: |_| Docker::default(),
		attributes: [
			attribute!(Docker, image: String, "Image name."),
			multi_value!(Docker, jvm_agents: struct Agent => AGENT, "JVM agents by name."),
		],
		injects: [inject!(Docker, project => PROJECT)],
		init: |docker: &mut Docker, _scope: &dyn Scope| {
			if docker.image.is_empty()
				&& let Some(project) = &docker.project
			{
				docker.image = format!("app:{}", project.read().version);
			}
			Ok(())
		},
	}
}

#[derive(Debug, Default)]
pub struct Publish;

fn publish_target(scope: &dyn Scope) -> Option<ComponentKey> {
	match scope.property("publish.via").as_deref() {
		Some("docker") => Some(DOCKER.key()),
		_ => None,
	}
}

component! {
	pub static PUBLISH: Publish = {
		name: "publish",
		description: "Publication.",
		create: |_| Publish,
		requires: [
			Requirement::Component(&BASE),
			Requirement::Dynamic { name: "publish_target", resolve: publish_target },
		],
	}
}

#[derive(Debug, Default)]
pub struct Broken {
	pub hits: u32,
}

component! {
	pub static BROKEN: Broken = {
		name: "broken",
		description: "Fails to initialize.",
		create: |_| Broken::default(),
		attributes: [attribute!(Broken, hits: u32, "Counter.")],
		post_inits: [post_init!(Broken, PROJECT: Project, |_: &mut Broken, project: &mut Project| {
			project.version = String::from("broken");
			Ok(())
		})],
		init: |_: &mut Broken, _: &dyn Scope| -> anyhow::Result<()> { anyhow::bail!("boom") },
	}
}

#[derive(Debug, Default)]
pub struct Report {
	pub pages: u32,
	pub stamped: u32,
}

component! {
	pub static REPORT: Report = {
		name: "report",
		description: "Generated site report.",
		create: |_| Report::default(),
		attributes: [attribute!(Report, pages: u32, "Number of pages.")],
	}
}

/// Loads the report from its own operation while stamping every report it
/// sees.
#[derive(Debug, Default)]
pub struct Site {
	pub seen_pages: u32,
	pub stamps: u32,
}

impl Site {
	fn render(&mut self, scope: &dyn Scope) -> anyhow::Result<()> {
		let report = scope.load::<Report>()?;
		self.seen_pages = report.read().pages;
		Ok(())
	}
}

component! {
	pub static SITE: Site = {
		name: "site",
		description: "Site generation.",
		create: |_| Site::default(),
		operations: [operation!(Site, render, "Renders the site.")],
		post_inits: [post_init!(Site, REPORT: Report, |site: &mut Site, report: &mut Report| {
			site.stamps += 1;
			report.stamped += 1;
			Ok(())
		})],
	}
}

pub fn catalog() -> Catalog {
	Catalog::new([&BASE, &PROJECT, &GIT, &MAVEN, &DOCKER, &PUBLISH, &BROKEN, &REPORT, &SITE]).unwrap()
}

/// Session where `local` components are declared by the base directory and
/// the whole catalog is on the classpath.
pub fn session(settings: Settings, local: &[&str]) -> Arc<Session> {
	let catalog = catalog();
	let scanner = StaticScanner {
		local: local.iter().map(|name| name.to_string()).collect(),
		classpath: catalog.names().into_iter().map(str::to_string).collect(),
	};
	Arc::new(Session::new(catalog).with_scanner(scanner).with_settings(settings))
}

pub fn write_properties(dir: &Path, text: &str) {
	std::fs::create_dir_all(dir).unwrap();
	std::fs::write(dir.join(PROPERTIES_FILE), text).unwrap();
}

/// Opens and initializes a runbase at `dir` with `log`.
pub fn init(session: &Arc<Session>, dir: &Path, log: &ActionLog) -> Arc<Runbase> {
	let runbase = session.open(dir).unwrap();
	runbase.init(log).unwrap();
	runbase
}

pub fn instantiate(key: ComponentKey) -> Action {
	Action::instantiate(key, ActionSource::CommandLine)
}

pub fn set(key: ComponentKey, member: &str, value: &str) -> Action {
	Action::set(key, member, Some(value.to_string()), ActionSource::CommandLine)
}

pub fn invoke(key: ComponentKey, member: &str) -> Action {
	Action::invoke(key, member, ActionSource::CommandLine)
}

pub fn names(keys: &[ComponentKey]) -> Vec<&'static str> {
	keys.iter().map(|key| key.name()).collect()
}

/// Log output collected by a test subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
	/// Runs `f` with a subscriber writing every event into this buffer.
	pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
		let subscriber = tracing_subscriber::fmt().with_writer(self.clone()).with_ansi(false).finish();
		tracing::subscriber::with_default(subscriber, f)
	}

	pub fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock()).into_owned()
	}
}

impl io::Write for CapturedLogs {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> MakeWriter<'a> for CapturedLogs {
	type Writer = Self;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

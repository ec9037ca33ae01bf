//! Testing utilities for the vdoc workspace
//!
//! Shared fixture beans modelled on a CI job definition: a [`JobSpec`] with
//! polymorphic parameters ([`ParamSpec`]) whose choice parameters carry a
//! polymorphic [`ChoiceProvider`].

#![allow(missing_docs)]

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Once;

use vdoc_core::prelude::*;
use vdoc_core::schema::{RegistryError, TypeRegistryBuilder};
use vdoc_core::tree::Sequence;

/// Parameter of a job
pub trait ParamSpec: DynBean + Debug {
    fn name(&self) -> &str;

    fn eq_dyn(&self, other: &dyn ParamSpec) -> bool;
}

impl Polymorphic for dyn ParamSpec {
    fn abstract_name() -> &'static str {
        "ParamSpec"
    }
}

impl PartialEq for dyn ParamSpec {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

/// Source of the values a choice parameter offers
pub trait ChoiceProvider: DynBean + Debug {
    fn eq_dyn(&self, other: &dyn ChoiceProvider) -> bool;
}

impl Polymorphic for dyn ChoiceProvider {
    fn abstract_name() -> &'static str {
        "ChoiceProvider"
    }
}

impl PartialEq for dyn ChoiceProvider {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

fn same<T: PartialEq + 'static>(this: &T, other: &dyn Any) -> bool {
    other.downcast_ref::<T>().is_some_and(|other| other == this)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TextParam {
    pub name: String,
    pub description: Option<String>,
    pub default_value: Option<String>,
}

impl Bean for TextParam {
    fn display_name() -> &'static str {
        "Text"
    }

    fn describe(props: &mut BeanDescriptor<Self>) {
        props.field("name", |p| &p.name, |p| &mut p.name).order(100);
        props.field("description", |p| &p.description, |p| &mut p.description).order(200);
        props.field("defaultValue", |p| &p.default_value, |p| &mut p.default_value).order(300);
    }
}

impl ParamSpec for TextParam {
    fn name(&self) -> &str {
        &self.name
    }

    fn eq_dyn(&self, other: &dyn ParamSpec) -> bool {
        same(self, other.as_any())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ChoiceParam {
    pub name: String,
    pub description: Option<String>,
    pub allow_multiple: bool,
    pub choice_provider: Option<Box<dyn ChoiceProvider>>,
}

impl Bean for ChoiceParam {
    fn display_name() -> &'static str {
        "Choice"
    }

    fn describe(props: &mut BeanDescriptor<Self>) {
        props.field("name", |p| &p.name, |p| &mut p.name).order(100);
        props.field("description", |p| &p.description, |p| &mut p.description).order(200);
        props.field("allowMultiple", |p| &p.allow_multiple, |p| &mut p.allow_multiple).order(300);
        props.field("choiceProvider", |p| &p.choice_provider, |p| &mut p.choice_provider).order(400);
    }
}

impl ParamSpec for ChoiceParam {
    fn name(&self) -> &str {
        &self.name
    }

    fn eq_dyn(&self, other: &dyn ParamSpec) -> bool {
        same(self, other.as_any())
    }
}

/// One fixed choice; `uuid` is denylisted and never persisted
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Choice {
    pub uuid: String,
    pub value: String,
    pub color: Option<String>,
}

impl Bean for Choice {
    fn display_name() -> &'static str {
        "Choice Item"
    }

    fn describe(props: &mut BeanDescriptor<Self>) {
        props.field("uuid", |c| &c.uuid, |c| &mut c.uuid);
        props.field("value", |c| &c.value, |c| &mut c.value).order(100);
        props.field("color", |c| &c.color, |c| &mut c.color).order(200);
    }
}

persist_bean!(Choice);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpecifiedChoices {
    pub choices: Vec<Choice>,
}

impl Bean for SpecifiedChoices {
    fn display_name() -> &'static str {
        "Specified Choices"
    }

    fn describe(props: &mut BeanDescriptor<Self>) {
        props.field("choices", |c| &c.choices, |c| &mut c.choices);
    }
}

impl ChoiceProvider for SpecifiedChoices {
    fn eq_dyn(&self, other: &dyn ChoiceProvider) -> bool {
        same(self, other.as_any())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScriptChoices {
    pub script: String,
}

impl Bean for ScriptChoices {
    fn display_name() -> &'static str {
        "Evaluate Script"
    }

    fn describe(props: &mut BeanDescriptor<Self>) {
        props.field("script", |c| &c.script, |c| &mut c.script);
    }
}

impl ChoiceProvider for ScriptChoices {
    fn eq_dyn(&self, other: &dyn ChoiceProvider) -> bool {
        same(self, other.as_any())
    }
}

/// CI job definition, schema version 4
///
/// History:
/// - v0 -> v1: `commands` was one multi-line string, now a list of lines
/// - v1 -> v2: `environment` renamed to `env`
/// - v2 -> v3: `!string` parameters renamed to `!text`
/// - v3 -> v4: `options.retry` moved to the top level, `options` dropped
#[derive(Debug, Default, PartialEq)]
pub struct JobSpec {
    pub uuid: String,
    pub name: String,
    pub image: String,
    pub commands: Vec<String>,
    pub params: Vec<Box<dyn ParamSpec>>,
    pub env: BTreeMap<String, String>,
    pub retry: Option<u32>,
}

impl Bean for JobSpec {
    fn display_name() -> &'static str {
        "Job"
    }

    fn describe(props: &mut BeanDescriptor<Self>) {
        props.field("uuid", |j| &j.uuid, |j| &mut j.uuid);
        props.field("retry", |j| &j.retry, |j| &mut j.retry);
        props.field("name", |j| &j.name, |j| &mut j.name).order(100);
        props.field("image", |j| &j.image, |j| &mut j.image).order(200);
        props.field("commands", |j| &j.commands, |j| &mut j.commands).order(300);
        props.field("params", |j| &j.params, |j| &mut j.params).order(400);
        props.field("env", |j| &j.env, |j| &mut j.env).order(500);
    }
}

impl Versioned for JobSpec {
    fn migrations() -> MigrationCatalogue {
        MigrationCatalogue::new()
            .step(0, "split commands into lines", split_commands)
            .step(1, "rename environment to env", |mut tree| {
                edit::rename_key(&mut tree, &NodePath::root(), "environment", "env")?;
                Ok(tree)
            })
            .step(2, "retag string params as text", |mut tree| {
                edit::retag(&mut tree, &NodePath::single("params"), "string", "text")?;
                Ok(tree)
            })
            .step(3, "move retry out of options", hoist_retry)
    }
}

fn split_commands(mut tree: Mapping) -> Result<Mapping, MigrationError> {
    edit::update(&mut tree, &NodePath::single("commands"), |node| match node {
        Node::Scalar(script) if !script.is_null() => Ok(script
            .value()
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(Node::from)
            .collect::<Sequence>()
            .into()),
        other => Ok(other),
    })?;
    Ok(tree)
}

fn hoist_retry(mut tree: Mapping) -> Result<Mapping, MigrationError> {
    let options = NodePath::single("options");
    edit::move_key(&mut tree, &options, &NodePath::root(), "retry")?;
    if tree.get("options").and_then(Node::as_mapping).is_some_and(Mapping::is_empty) {
        tree.remove("options");
    }
    Ok(tree)
}

/// Registry builder holding every fixture implementation
#[must_use]
pub fn fixture_builder() -> TypeRegistryBuilder {
    let mut builder = TypeRegistry::builder();
    register_implementations!(builder, dyn ParamSpec => [TextParam, ChoiceParam]);
    register_implementations!(builder, dyn ChoiceProvider => [SpecifiedChoices, ScriptChoices]);
    builder
}

/// Standalone registry of the fixtures
///
/// # Errors
/// Returns error if two fixtures share a tag.
pub fn fixture_registry() -> Result<TypeRegistry, RegistryError> {
    fixture_builder().build()
}

/// Install the fixture registry as the process-wide registry
///
/// # Errors
/// Returns error if two fixtures share a tag.
pub fn install_fixtures() -> Result<&'static TypeRegistry, RegistryError> {
    TypeRegistry::global_or_init(fixture_builder)
}

/// Job exercising every fixture type
#[must_use]
pub fn sample_job() -> JobSpec {
    JobSpec {
        uuid: "0d9c3e52".into(),
        name: "ci".into(),
        image: "rust".into(),
        commands: vec!["cargo build".into(), "cargo test".into()],
        params: vec![
            Box::new(TextParam {
                name: "branch".into(),
                default_value: Some("main".into()),
                ..TextParam::default()
            }),
            Box::new(ChoiceParam {
                name: "profile".into(),
                description: Some("Build profile".into()),
                allow_multiple: false,
                choice_provider: Some(Box::new(SpecifiedChoices {
                    choices: vec![
                        Choice {
                            value: "debug".into(),
                            ..Choice::default()
                        },
                        Choice {
                            value: "release".into(),
                            color: Some("#0d87e9".into()),
                            ..Choice::default()
                        },
                    ],
                })),
            }),
        ],
        env: BTreeMap::from([("RUST_LOG".to_string(), "info".to_string())]),
        retry: Some(2),
    }
}

/// Emitted text of [`sample_job`] at the current schema
pub const SAMPLE_JOB_YAML: &str = "\
version: 4
name: ci
image: rust
commands:
- cargo build
- cargo test
params:
- !text
  name: branch
  defaultValue: main
- !choice
  name: profile
  description: Build profile
  allowMultiple: false
  choiceProvider: !specified-choices
    choices:
    - value: debug
    - value: release
      color: '#0d87e9'
env:
  RUST_LOG: info
retry: 2
";

static TRACING: Once = Once::new();

/// Install a test tracing subscriber once; filter from `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        // Another subscriber may already be installed by the test binary
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

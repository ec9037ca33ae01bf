use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vdoc_core::prelude::*;
use vdoc_test_utils::{
    fixture_registry, init_tracing, install_fixtures, sample_job, ChoiceParam, JobSpec,
    ParamSpec, ScriptChoices, TextParam, SAMPLE_JOB_YAML,
};

fn setup() -> &'static TypeRegistry {
    init_tracing();
    install_fixtures().unwrap()
}

fn without_identity(mut job: JobSpec) -> JobSpec {
    job.uuid.clear();
    job
}

#[test]
fn test_emitted_text_matches_fixture() {
    setup();
    let text = vdoc_core::to_yaml(&sample_job()).unwrap();
    assert_eq!(text, SAMPLE_JOB_YAML);
}

#[test]
fn test_object_round_trip() {
    setup();
    let text = vdoc_core::to_yaml(&sample_job()).unwrap();
    let loaded: JobSpec = vdoc_core::from_yaml(&text).unwrap();
    assert_eq!(loaded, without_identity(sample_job()));
}

#[test]
fn test_document_stamps_current_version_first() {
    setup();
    let document = VersionedDocument::from_object(&sample_job()).unwrap();
    assert_eq!(document.version().unwrap(), 4);
    assert_eq!(document.root().keys().next(), Some("version"));
}

#[test]
fn test_denylisted_identity_never_written() {
    setup();
    let text = vdoc_core::to_yaml(&sample_job()).unwrap();
    assert!(!text.contains("uuid"));
    assert!(!text.contains("0d9c3e52"));
}

#[test]
fn test_empty_fields_omitted() {
    setup();
    let job = JobSpec {
        name: "lint".into(),
        image: "rust".into(),
        ..JobSpec::default()
    };
    let text = vdoc_core::to_yaml(&job).unwrap();
    assert_eq!(text, "version: 4\nname: lint\nimage: rust\n");

    let loaded: JobSpec = vdoc_core::from_yaml(&text).unwrap();
    assert_eq!(loaded, job);
}

#[test]
fn test_custom_denylist_keeps_identity() {
    let registry = fixture_registry().unwrap();
    let ctx = DocumentOptions::default()
        .with_denylist(Vec::<String>::new())
        .context(&registry);
    let document = VersionedDocument::from_object_with(&sample_job(), &ctx).unwrap();
    assert_eq!(
        document.root().get("uuid").and_then(Node::as_str),
        Some("0d9c3e52")
    );
    let loaded: JobSpec = document.to_object_with(&ctx).unwrap();
    assert_eq!(loaded, sample_job());
}

#[test]
fn test_script_provider_round_trip() {
    let registry = fixture_registry().unwrap();
    let ctx = DocumentOptions::default().context(&registry);
    let job = JobSpec {
        name: "deploy".into(),
        params: vec![Box::new(ChoiceParam {
            name: "target".into(),
            allow_multiple: true,
            choice_provider: Some(Box::new(ScriptChoices {
                script: "return targets()".into(),
            })),
            ..ChoiceParam::default()
        })],
        ..JobSpec::default()
    };
    let document = VersionedDocument::from_object_with(&job, &ctx).unwrap();
    let text = document.to_yaml().unwrap();
    assert!(text.contains("choiceProvider: !evaluate-script\n"));

    let loaded: JobSpec = VersionedDocument::from_yaml(&text)
        .unwrap()
        .to_object_with(&ctx)
        .unwrap();
    assert_eq!(loaded, job);
    assert_eq!(loaded.params[0].name(), "target");
}

fn text_param() -> impl Strategy<Value = Box<dyn ParamSpec>> {
    (
        "[a-z]{1,8}",
        proptest::option::of("[A-Za-z ]{1,16}"),
        proptest::option::of("[a-z0-9]{1,8}"),
    )
        .prop_map(|(name, description, default_value)| {
            Box::new(TextParam {
                name,
                description,
                default_value,
            }) as Box<dyn ParamSpec>
        })
}

fn job() -> impl Strategy<Value = JobSpec> {
    (
        "[a-z][a-z0-9-]{0,12}",
        "[a-z]{1,10}",
        proptest::collection::vec("[a-z]{1,6}( [a-z-]{1,6}){0,2}", 0..4),
        proptest::collection::vec(text_param(), 0..3),
        proptest::collection::btree_map("[A-Z_]{1,8}", "[a-z0-9]{1,8}", 0..3),
        proptest::option::of(0u32..10),
    )
        .prop_map(|(name, image, commands, params, env, retry)| JobSpec {
            uuid: String::new(),
            name,
            image,
            commands,
            params,
            env: env.into_iter().collect::<BTreeMap<_, _>>(),
            retry,
        })
}

proptest! {
    #[test]
    fn prop_round_trip_preserves_persisted_fields(job in job()) {
        let registry = fixture_registry().unwrap();
        let ctx = DocumentOptions::default().context(&registry);
        let document = VersionedDocument::from_object_with(&job, &ctx).unwrap();
        let text = document.to_yaml().unwrap();
        let loaded: JobSpec = VersionedDocument::from_yaml(&text)
            .unwrap()
            .to_object_with(&ctx)
            .unwrap();
        prop_assert_eq!(loaded, job);
    }

    #[test]
    fn prop_emission_is_deterministic(job in job()) {
        let registry = fixture_registry().unwrap();
        let ctx = DocumentOptions::default().context(&registry);
        let first = VersionedDocument::from_object_with(&job, &ctx).unwrap().to_yaml().unwrap();
        let second = VersionedDocument::from_object_with(&job, &ctx).unwrap().to_yaml().unwrap();
        prop_assert_eq!(first, second);
    }
}

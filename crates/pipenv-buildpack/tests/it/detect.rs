//! Detection against the fixture apps.

use pipenv_buildpack::config::Config;
use pipenv_buildpack::detect::{BuildPlanMetadata, Requirement, detect};

use crate::common::{fixture_app, printer};

fn requirement(name: &str, version: &str, source: &str) -> Requirement {
    Requirement {
        name: name.to_owned(),
        metadata: BuildPlanMetadata {
            version_source: source.to_owned(),
            version: version.to_owned(),
            build: true,
            launch: false,
        },
    }
}

#[test]
fn empty_app_fails() {
    let app = tempfile::tempdir().unwrap();
    let (printer, buffer) = printer();

    let plan = detect(app.path(), &Config::default(), &printer).unwrap();

    assert!(plan.is_none());
    insta::assert_snapshot!(buffer.contents().trim(), @"debug: no Pipfile found");
}

#[test]
fn requirements_txt_takes_over() {
    let app = fixture_app("conflict_app");
    let (printer, buffer) = printer();

    let plan = detect(app.path(), &Config::default(), &printer).unwrap();

    assert!(plan.is_none());
    insta::assert_snapshot!(buffer.contents().trim(), @"found Pipfile + requirements.txt");
}

#[test]
fn pipfile_app_passes() {
    let app = fixture_app("pipfile_app");
    let (printer, buffer) = printer();

    let plan = detect(app.path(), &Config::default(), &printer)
        .unwrap()
        .unwrap();

    assert_eq!(plan.provides, ["pipenv"]);
    assert_eq!(
        plan.requires,
        [
            requirement("pip", "", ""),
            requirement("cpython", "3.11", "Pipfile"),
            requirement("pipenv", "", ""),
        ]
    );
    assert_eq!(buffer.contents(), "");
}

#[test]
fn locked_app_with_pinned_pipenv() {
    let app = fixture_app("lock_app");
    let config = Config {
        pipenv_version: Some("2023.12.*".to_owned()),
        cpython_version: Some("3.12".to_owned()),
        ..Config::default()
    };
    let (printer, buffer) = printer();

    let plan = detect(app.path(), &config, &printer).unwrap().unwrap();

    assert_eq!(
        plan.requires,
        [
            requirement("pip", "", ""),
            requirement("cpython", "3.12", "Pipfile.lock"),
            requirement("pipenv", "2023.12.*", "BP_PIPENV_VERSION"),
        ]
    );
    assert_eq!(buffer.contents(), "");

    let build_plan = plan.into_build_plan().unwrap();
    assert_eq!(build_plan.provides.len(), 1);
    assert_eq!(build_plan.requires.len(), 3);
}

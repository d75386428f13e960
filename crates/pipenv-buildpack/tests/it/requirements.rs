//! `requirements.txt` generation for the fixture apps.

use pipenv_buildpack::pipfile::PipfileLock;
use pipenv_buildpack::requirements::to_requirements_txt;

use crate::common::fixtures_dir;

#[test]
fn locked_app_requirements() {
    let lock = PipfileLock::from_path(&fixtures_dir().join("lock_app/Pipfile.lock")).unwrap();

    insta::assert_snapshot!(to_requirements_txt(&lock), @r"
    -i https://pypi.org/simple
    --extra-index-url http://pypi.internal/simple
    --trusted-host pypi.internal
    blinker==1.8.2; python_version >= '3.8'
    flask==3.0.3; python_version >= '3.8'
    internal-lib==0.4.0
    requests[socks]==2.32.3; python_version >= '3.8'
    ");
}

#[test]
fn lock_metadata() {
    let lock = PipfileLock::from_path(&fixtures_dir().join("lock_app/Pipfile.lock")).unwrap();

    assert_eq!(lock.python_version(), Some("3.12"));
    assert_eq!(lock.meta.pipfile_spec, Some(6));
    assert_eq!(lock.default.len(), 4);
    assert_eq!(lock.develop.len(), 1);
}

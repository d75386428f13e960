use pipenv_buildpack::PipenvBuildpack;
use pipenv_buildpack::config::LogLevel;
use pipenv_buildpack::logging::setup_logging;

fn main() {
    setup_logging(LogLevel::from_process_env());

    libcnb::libcnb_runtime(&PipenvBuildpack);
}

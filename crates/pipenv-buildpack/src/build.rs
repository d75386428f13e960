//! The build phase.
//!
//! Installs the selected Pipenv release into the cached `pipenv` layer,
//! exposes its site-packages on `PYTHONPATH` and writes the app's
//! `requirements.txt` into the build-only `requirements` layer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use jiff::Timestamp;
use libcnb::build::{BuildContext, BuildResult, BuildResultBuilder};
use libcnb::data::layer_name;
use libcnb::data::sbom::SbomFormat;
use libcnb::layer::{
    CachedLayerDefinition, InvalidMetadataAction, LayerState, RestoredLayerAction,
    UncachedLayerDefinition,
};
use libcnb::layer_env::{LayerEnv, ModificationBehavior, Scope};
use libcnb::sbom::Sbom;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dependency::{
    BuildpackMetadata, Dependency, DependencyError, DependencyManager, DependencyService,
    DependencyTarget,
};
use crate::errors::PipenvBuildpackError;
use crate::executable::CommandExecutable;
use crate::install::{InstallProcess, PipenvInstallProcess};
use crate::plan::{self, PlanEntry};
use crate::printer::Printer;
use crate::requirements::{self, LockProcess, PipenvLockProcess};
use crate::site::{SitePackageProcess, SiteProcess};
use crate::{PIPENV, PRIORITIES, PipenvBuildpack, sbom};

/// Metadata stored alongside the `pipenv` layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipenvLayerMetadata {
    /// sha256 of the installed release artifact.
    pub dependency_sha: String,
    pub built_at: String,
}

/// Keep a restored layer only when it holds the same release.
pub fn restored_layer_action(cached: &PipenvLayerMetadata, checksum: &str) -> RestoredLayerAction {
    if cached.dependency_sha == checksum {
        RestoredLayerAction::KeepLayer
    } else {
        RestoredLayerAction::DeleteLayer
    }
}

/// The external collaborators of the build, behind their seams.
pub struct Installer<'a> {
    pub dependencies: &'a dyn DependencyManager,
    pub install_process: &'a dyn InstallProcess,
    pub site_process: &'a dyn SitePackageProcess,
    pub lock_process: &'a dyn LockProcess,
}

impl Installer<'_> {
    /// Deliver the release into a scratch directory and install it into the
    /// layer at `layer_path`.
    pub fn install(
        &self,
        dependency: &Dependency,
        buildpack_dir: &Path,
        layer_path: &Path,
        printer: &Printer,
    ) -> Result<(), PipenvBuildpackError> {
        let release_dir = tempfile::Builder::new()
            .prefix("pipenv-release")
            .tempdir()
            .map_err(PipenvBuildpackError::TempDir)?;

        printer.subprocess(&format!(
            "Installing {} {}",
            dependency.display_name(),
            dependency.version
        ));
        let start = Instant::now();

        self.dependencies
            .deliver(dependency, buildpack_dir, release_dir.path())?;
        self.install_process
            .execute(release_dir.path(), layer_path)?;

        printer.action(&format!("Completed in {:.2?}", start.elapsed()));
        printer.break_line();
        Ok(())
    }

    /// The site-packages directory Pipenv was installed into.
    pub fn site_packages(&self, layer_path: &Path) -> Result<PathBuf, PipenvBuildpackError> {
        let site_packages = self.site_process.execute(layer_path)?;
        if site_packages.is_empty() {
            return Err(PipenvBuildpackError::MissingSitePackages);
        }
        Ok(PathBuf::from(site_packages))
    }
}

/// Choose the Pipenv release for the plan entries, logging the candidates and
/// the selection.
pub fn select_dependency(
    entries: &[PlanEntry],
    metadata: &BuildpackMetadata,
    target: &DependencyTarget,
    printer: &Printer,
    now: Timestamp,
) -> Result<Dependency, DependencyError> {
    let (entry, sorted) = plan::resolve(PIPENV, entries, PRIORITIES);
    let entry = entry.cloned().unwrap_or_else(|| PlanEntry {
        name: PIPENV.to_owned(),
        ..PlanEntry::default()
    });

    printer.candidates(&sorted);

    let dependency = metadata.resolve(PIPENV, &entry.version, target)?;
    tracing::debug!(version = %dependency.version, uri = %dependency.uri, "Selected dependency");
    printer.selected_dependency(&entry, &dependency, now);

    Ok(dependency)
}

/// Run the build phase.
pub fn build(
    context: &BuildContext<PipenvBuildpack>,
    config: &Config,
    printer: &Printer,
) -> libcnb::Result<BuildResult, PipenvBuildpackError> {
    let dependencies = DependencyService::new().map_err(PipenvBuildpackError::from)?;
    let install_process = PipenvInstallProcess::new(CommandExecutable::new("pip"));
    let site_process = SiteProcess::new(CommandExecutable::new("python"));
    let lock_process = PipenvLockProcess::new(CommandExecutable::new("python"));
    let installer = Installer {
        dependencies: &dependencies,
        install_process: &install_process,
        site_process: &site_process,
        lock_process: &lock_process,
    };

    let descriptor = &context.buildpack_descriptor.buildpack;
    printer.title(&format!(
        "{} {}",
        descriptor.name.as_deref().unwrap_or("Pipenv Buildpack"),
        descriptor.version
    ));

    printer.process("Resolving Pipenv version");
    let entries: Vec<PlanEntry> = context
        .buildpack_plan
        .entries
        .iter()
        .map(PlanEntry::from)
        .collect();
    let target = DependencyTarget::new(config.stack.clone(), &context.target);
    let dependency = select_dependency(
        &entries,
        &context.buildpack_descriptor.metadata,
        &target,
        printer,
        Timestamp::now(),
    )
    .map_err(PipenvBuildpackError::from)?;

    let (launch, build) = plan::merge_layer_types(PIPENV, &entries);
    let checksum = dependency
        .checksum()
        .ok_or_else(|| DependencyError::MissingChecksum {
            id: dependency.id.clone(),
            version: dependency.version.clone(),
        })
        .map_err(PipenvBuildpackError::from)?
        .to_owned();

    let layer = context.cached_layer(
        layer_name!("pipenv"),
        CachedLayerDefinition {
            build,
            launch,
            invalid_metadata_action: &|_| InvalidMetadataAction::DeleteLayer,
            restored_layer_action: &|cached: &PipenvLayerMetadata, _| {
                restored_layer_action(cached, &checksum)
            },
        },
    )?;
    let layer_path = layer.path();

    match layer.state {
        LayerState::Restored { .. } => {
            printer.process(&format!("Reusing cached layer {}", layer_path.display()));
            printer.break_line();
        }
        LayerState::Empty { .. } => {
            printer.process("Executing build process");
            installer.install(&dependency, &context.buildpack_dir, &layer_path, printer)?;

            layer.write_metadata(PipenvLayerMetadata {
                dependency_sha: checksum.clone(),
                built_at: Timestamp::now().to_string(),
            })?;
        }
    }

    let sbom = sbom::cyclonedx(&dependency).map_err(PipenvBuildpackError::Sbom)?;
    layer.write_sboms(&[Sbom::from_bytes(SbomFormat::CycloneDxJson, sbom)])?;

    let site_packages = installer.site_packages(&layer_path)?;
    layer.write_env(
        LayerEnv::new()
            .chainable_insert(
                Scope::All,
                ModificationBehavior::Prepend,
                "PYTHONPATH",
                &site_packages,
            )
            .chainable_insert(Scope::All, ModificationBehavior::Delimiter, "PYTHONPATH", ":"),
    )?;
    printer.environment_variables(&[("PYTHONPATH", site_packages.as_path())], build, launch);

    printer.process("Generating requirements.txt");
    let contents = requirements::requirements_for_app(
        &context.app_dir,
        &layer_path,
        &site_packages,
        installer.lock_process,
        printer,
    )
    .map_err(PipenvBuildpackError::from)?;

    let requirements_layer = context.uncached_layer(
        layer_name!("requirements"),
        UncachedLayerDefinition {
            build: true,
            launch: false,
        },
    )?;
    let path =
        requirements::write_requirements(&contents, &requirements_layer.path(), &context.app_dir)
            .map_err(PipenvBuildpackError::from)?;
    printer.subprocess(&format!("Wrote {}", path.display()));
    printer.break_line();

    BuildResultBuilder::new().build()
}

//! Resolution of the buildpack plan entries handed to the build phase.
//!
//! Several buildpacks may require `pipenv`, each with its own version and
//! layer flags. The entry whose `version-source` ranks highest in the
//! priority list decides the version; the layer flags are merged.

use libcnb::data::buildpack_plan::Entry;

/// A buildpack plan entry with its metadata read into typed fields.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub name: String,
    /// Requested version constraint, empty when none was given.
    pub version: String,
    /// Where the version came from, e.g. `BP_PIPENV_VERSION`.
    pub version_source: String,
    pub build: bool,
    pub launch: bool,
}

impl From<&Entry> for PlanEntry {
    fn from(entry: &Entry) -> Self {
        let string = |key: &str| {
            entry
                .metadata
                .get(key)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_owned()
        };
        let flag = |key: &str| {
            entry
                .metadata
                .get(key)
                .and_then(|value| value.as_bool())
                .unwrap_or(false)
        };

        Self {
            name: entry.name.clone(),
            version: string("version"),
            version_source: string("version-source"),
            build: flag("build"),
            launch: flag("launch"),
        }
    }
}

/// Pick the entry named `name` whose version source has the highest priority.
///
/// Returns the chosen entry and every entry named `name` sorted by priority.
/// Entries with a source missing from `priorities` sort last, keeping their
/// relative order.
pub fn resolve<'a>(
    name: &str,
    entries: &'a [PlanEntry],
    priorities: &[&str],
) -> (Option<&'a PlanEntry>, Vec<&'a PlanEntry>) {
    let mut matching: Vec<&PlanEntry> =
        entries.iter().filter(|entry| entry.name == name).collect();

    matching.sort_by_key(|entry| {
        priorities
            .iter()
            .position(|priority| *priority == entry.version_source)
            .unwrap_or(priorities.len())
    });

    (matching.first().copied(), matching)
}

/// Merge the layer flags of every entry named `name`, as `(launch, build)`.
pub fn merge_layer_types(name: &str, entries: &[PlanEntry]) -> (bool, bool) {
    entries
        .iter()
        .filter(|entry| entry.name == name)
        .fold((false, false), |(launch, build), entry| {
            (launch || entry.launch, build || entry.build)
        })
}

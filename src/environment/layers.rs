//! Resource layers: the scoped search locations and the host parent they delegate to.

use crate::error::ProviderError;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Where a resource was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrigin {
    /// A file inside one of the scoped locations.
    File(PathBuf),
    /// A resource bundled with the generator.
    Bundled,
}

impl fmt::Display for ResourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceOrigin::File(path) => write!(f, "{}", path.display()),
            ResourceOrigin::Bundled => write!(f, "<bundled>"),
        }
    }
}

/// A text resource located by name (`/`-separated, relative to a location root).
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub origin: ResourceOrigin,
    pub contents: String,
}

impl Resource {
    /// Human-readable identity for error messages.
    pub fn describe(&self) -> String {
        match &self.origin {
            ResourceOrigin::File(path) => path.display().to_string(),
            ResourceOrigin::Bundled => format!("{} (bundled)", self.name),
        }
    }
}

/// One level of the resource search chain.
pub trait ResourceLayer: Send + Sync + fmt::Debug {
    /// Every resource with this name in the layer, in search order.
    fn find(&self, name: &str) -> Result<Vec<Resource>, ProviderError>;

    /// Names of all resources ending with `suffix`, sorted and de-duplicated.
    fn list(&self, suffix: &str) -> Result<Vec<String>, ProviderError>;
}

/// Searches only the declared locations, in order.
#[derive(Debug, Clone)]
pub struct ScopedLayer {
    locations: Vec<PathBuf>,
}

impl ScopedLayer {
    pub fn new(locations: Vec<PathBuf>) -> Self {
        Self { locations }
    }

    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }
}

/// Resource names are relative and may not climb out of a location.
fn confined_path(root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    if relative.is_absolute() {
        return None;
    }
    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(path)
}

impl ResourceLayer for ScopedLayer {
    fn find(&self, name: &str) -> Result<Vec<Resource>, ProviderError> {
        let mut found = Vec::new();
        for location in &self.locations {
            let Some(path) = confined_path(location, name) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            let contents = std::fs::read_to_string(&path).map_err(|source| ProviderError::Io {
                path: path.clone(),
                source,
            })?;
            found.push(Resource {
                name: name.to_string(),
                origin: ResourceOrigin::File(path),
                contents,
            });
        }
        Ok(found)
    }

    fn list(&self, suffix: &str) -> Result<Vec<String>, ProviderError> {
        let mut names = BTreeSet::new();
        for location in &self.locations {
            for entry in WalkDir::new(location).follow_links(false).sort_by_file_name() {
                let entry = entry.map_err(|e| ProviderError::Io {
                    path: location.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to walk directory: {}", e),
                    ),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(location) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if name.ends_with(suffix) {
                    names.insert(name);
                }
            }
        }
        Ok(names.into_iter().collect())
    }
}

pub const BASIC_TYPES_RESOURCE: &str = "META-INF/ddlgen/basic-types.toml";

/// Resources shared by every invocation: only what ships with the generator, never
/// the working directory of the host process.
#[derive(Debug, Clone)]
pub struct HostLayer {
    bundled: Vec<(&'static str, &'static str)>,
}

impl HostLayer {
    pub fn bundled() -> Self {
        Self {
            bundled: vec![(BASIC_TYPES_RESOURCE, include_str!("basic_types.toml"))],
        }
    }

    pub fn with_resources(bundled: Vec<(&'static str, &'static str)>) -> Self {
        Self { bundled }
    }
}

impl Default for HostLayer {
    fn default() -> Self {
        Self::bundled()
    }
}

impl ResourceLayer for HostLayer {
    fn find(&self, name: &str) -> Result<Vec<Resource>, ProviderError> {
        Ok(self
            .bundled
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(n, contents)| Resource {
                name: n.to_string(),
                origin: ResourceOrigin::Bundled,
                contents: contents.to_string(),
            })
            .collect())
    }

    fn list(&self, suffix: &str) -> Result<Vec<String>, ProviderError> {
        let names: BTreeSet<String> = self
            .bundled
            .iter()
            .filter(|(n, _)| n.ends_with(suffix))
            .map(|(n, _)| n.to_string())
            .collect();
        Ok(names.into_iter().collect())
    }
}

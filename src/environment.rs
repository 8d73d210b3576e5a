//! Isolated Resource Resolver
//!
//! Builds the [`ExecutionEnvironment`] a generation runs against. Resources are searched
//! in the unit's declared root (then an optional fallback compiled-output location) and
//! only then in the host layer, which carries nothing but the resources bundled with the
//! generator. Type resolution sits on top and, when the dynamic capability is enabled,
//! synthesizes placeholders for types that exist only in metadata.

use crate::error::{DdlError, ProviderError};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub mod layers;
pub mod types;

pub use layers::{HostLayer, Resource, ResourceLayer, ResourceOrigin, ScopedLayer};
pub use types::{
    AttributeDescriptor, BasicType, BasicTypeCatalog, ResolvedType, SyntheticType, TypeDescriptor,
};

/// Whether types absent as compiled artifacts may be synthesized on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionCapability {
    CompiledOnly,
    Dynamic,
}

/// Resource search environment owned by exactly one invocation.
///
/// Deliberately not `Clone`: the invoker takes it by value and moves it onto the worker.
#[derive(Debug)]
pub struct ExecutionEnvironment {
    scoped: ScopedLayer,
    parent: Box<dyn ResourceLayer>,
    capability: ResolutionCapability,
    catalog: BasicTypeCatalog,
}

/// Builder for [`ExecutionEnvironment`].
#[derive(Debug)]
pub struct EnvironmentBuilder {
    search_root: PathBuf,
    fallback: Option<PathBuf>,
    capability: ResolutionCapability,
    parent: Option<Box<dyn ResourceLayer>>,
}

impl EnvironmentBuilder {
    pub fn new(search_root: impl Into<PathBuf>) -> Self {
        Self {
            search_root: search_root.into(),
            fallback: None,
            capability: ResolutionCapability::Dynamic,
            parent: None,
        }
    }

    /// Additional location searched after the declared root.
    pub fn fallback(mut self, location: Option<PathBuf>) -> Self {
        self.fallback = location;
        self
    }

    pub fn virtual_access(mut self, enabled: bool) -> Self {
        self.capability = if enabled {
            ResolutionCapability::Dynamic
        } else {
            ResolutionCapability::CompiledOnly
        };
        self
    }

    /// Replace the host layer (defaults to [`HostLayer::bundled`]).
    pub fn parent(mut self, parent: Box<dyn ResourceLayer>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Result<ExecutionEnvironment, DdlError> {
        if self.search_root.as_os_str().is_empty() {
            return Err(DdlError::Configuration(
                "No search root defined for the persistence unit".to_string(),
            ));
        }

        let mut locations = vec![open_location(&self.search_root, "search root")?];
        if let Some(fallback) = &self.fallback {
            let fallback = open_location(fallback, "fallback location")?;
            if !locations.contains(&fallback) {
                locations.push(fallback);
            }
        }

        let scoped = ScopedLayer::new(locations);
        let parent = self
            .parent
            .unwrap_or_else(|| Box::new(HostLayer::bundled()));
        let catalog = load_catalog(&scoped, parent.as_ref())?;

        debug!(
            locations = ?scoped.locations(),
            capability = ?self.capability,
            basic_types = catalog.len(),
            "Execution environment constructed"
        );

        Ok(ExecutionEnvironment {
            scoped,
            parent,
            capability: self.capability,
            catalog,
        })
    }
}

fn open_location(path: &Path, what: &str) -> Result<PathBuf, DdlError> {
    if !path.exists() {
        return Err(DdlError::EnvironmentConstruction(format!(
            "The {} {:?} does not exist",
            what, path
        )));
    }
    if !path.is_dir() {
        return Err(DdlError::EnvironmentConstruction(format!(
            "The {} {:?} is not a directory (archives are not supported)",
            what, path
        )));
    }
    dunce::canonicalize(path).map_err(|e| {
        DdlError::EnvironmentConstruction(format!("Cannot open the {} {:?}: {}", what, path, e))
    })
}

fn load_catalog(
    scoped: &ScopedLayer,
    parent: &dyn ResourceLayer,
) -> Result<BasicTypeCatalog, DdlError> {
    let to_env_error = |e: ProviderError| DdlError::EnvironmentConstruction(e.to_string());
    let resource = match scoped.find(layers::BASIC_TYPES_RESOURCE).map_err(to_env_error)?.into_iter().next() {
        Some(local) => Some(local),
        None => parent
            .find(layers::BASIC_TYPES_RESOURCE)
            .map_err(to_env_error)?
            .into_iter()
            .next(),
    };
    match resource {
        Some(resource) => BasicTypeCatalog::parse(&resource.contents).map_err(|e| {
            DdlError::EnvironmentConstruction(format!(
                "Malformed basic type catalog {}: {}",
                resource.describe(),
                e
            ))
        }),
        None => Ok(BasicTypeCatalog::default()),
    }
}

impl ExecutionEnvironment {
    pub fn builder(search_root: impl Into<PathBuf>) -> EnvironmentBuilder {
        EnvironmentBuilder::new(search_root)
    }

    /// Scoped locations in search order.
    pub fn locations(&self) -> &[PathBuf] {
        self.scoped.locations()
    }

    pub fn capability(&self) -> ResolutionCapability {
        self.capability
    }

    pub fn supports_virtual_access(&self) -> bool {
        self.capability == ResolutionCapability::Dynamic
    }

    /// First resource with this name: scoped locations first, then the host layer.
    pub fn locate(&self, name: &str) -> Result<Option<Resource>, ProviderError> {
        if let Some(local) = self.scoped.find(name)?.into_iter().next() {
            trace!(resource = name, origin = %local.origin, "Resolved locally");
            return Ok(Some(local));
        }
        Ok(self.parent.find(name)?.into_iter().next())
    }

    /// Every resource with this name across the whole chain, in search order.
    pub fn locate_all(&self, name: &str) -> Result<Vec<Resource>, ProviderError> {
        let mut all = self.scoped.find(name)?;
        all.extend(self.parent.find(name)?);
        Ok(all)
    }

    /// Resource names under the scoped locations ending with `suffix`. The host layer
    /// never takes part in discovery.
    pub fn list_resources(&self, suffix: &str) -> Result<Vec<String>, ProviderError> {
        self.scoped.list(suffix)
    }

    /// Resolve a type name: basic types, then compiled descriptors, then basic types
    /// by simple name, then (with the dynamic capability) a synthesized placeholder.
    pub fn resolve(&self, name: &str) -> Result<ResolvedType, ProviderError> {
        if let Some(basic) = self.catalog.get(name) {
            return Ok(ResolvedType::Basic(basic));
        }

        let resource_name = types::descriptor_resource_name(name);
        if let Some(resource) = self.locate(&resource_name)? {
            let descriptor = TypeDescriptor::parse(name, &resource.contents)
                .map_err(|e| types::malformed(resource.describe(), e))?;
            return Ok(ResolvedType::Compiled(descriptor));
        }

        if let Some(basic) = self.catalog.get_by_simple_name(name) {
            return Ok(ResolvedType::Basic(basic));
        }

        match self.capability {
            ResolutionCapability::Dynamic => {
                debug!(type_name = name, "Synthesizing placeholder for metadata-only type");
                Ok(ResolvedType::Synthesized(SyntheticType {
                    name: name.to_string(),
                }))
            }
            ResolutionCapability::CompiledOnly => Err(ProviderError::TypeNotFound(name.to_string())),
        }
    }
}

//! Static registry of application variants.
//!
//! Each [`AppEntry`] pairs an [`AppDescriptor`] with the factories that build
//! its device and its application. Entries are registered explicitly at
//! startup; resolution picks one with the [`Resolver`].

use std::borrow::Cow;
use std::sync::Arc;

use crate::device::{App, AppContext, AppFactory, Device, DeviceFactory};
use crate::error::{AppError, DeviceError, ResolveError};
use crate::platform::{AppDescriptor, DeviceTarget, PlatformKind, ResolveWarning, Resolver};

#[derive(Clone)]
pub struct AppEntry {
    descriptor: AppDescriptor,
    device: DeviceFactory,
    app: AppFactory,
}

impl AppEntry {
    pub fn new<D, A>(name: impl Into<Cow<'static, str>>, target: DeviceTarget, device: D, app: A) -> Self
    where
        D: Fn() -> Result<Box<dyn Device>, DeviceError> + Send + Sync + 'static,
        A: Fn(AppContext) -> Result<Arc<dyn App>, AppError> + Send + Sync + 'static,
    {
        Self {
            descriptor: AppDescriptor::new(name, target),
            device: Arc::new(device),
            app: Arc::new(app),
        }
    }

    pub fn descriptor(&self) -> &AppDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn target(&self) -> DeviceTarget {
        self.descriptor.target
    }

    pub(crate) fn build_device(&self) -> Result<Box<dyn Device>, DeviceError> {
        (self.device)()
    }

    pub(crate) fn build_app(&self, ctx: AppContext) -> Result<Arc<dyn App>, AppError> {
        (self.app)(ctx)
    }
}

impl std::fmt::Debug for AppEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered list of registered applications.
#[derive(Clone, Debug, Default)]
pub struct AppRegistry {
    entries: Vec<AppEntry>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: AppEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn with(mut self, entry: AppEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptors(&self) -> Vec<AppDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Picks the entry for `platform`.
    pub fn resolve(
        &self,
        platform: PlatformKind,
        resolver: Resolver,
    ) -> Result<(&AppEntry, Option<ResolveWarning>), ResolveError> {
        let descriptors = self.descriptors();
        let resolution = resolver.resolve(platform, &descriptors)?;
        let entry = self
            .entries
            .get(resolution.index)
            .ok_or(ResolveError::NoMatch { platform })?;
        Ok((entry, resolution.warning))
    }
}

impl FromIterator<AppEntry> for AppRegistry {
    fn from_iter<T: IntoIterator<Item = AppEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Desktop;
    use crate::hardware::DeviceVariant;
    use crate::platform::HardwareRevision;

    struct Idle;

    #[async_trait::async_trait]
    impl App for Idle {
        async fn run(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn entry(name: &'static str, target: DeviceTarget) -> AppEntry {
        AppEntry::new(
            name,
            target,
            || Ok(Box::new(Desktop::new()) as Box<dyn Device>),
            |_ctx| Ok(Arc::new(Idle) as Arc<dyn App>),
        )
    }

    #[test]
    fn resolves_to_the_registered_entry() {
        let registry: AppRegistry = [
            entry("desk", DeviceTarget::Desktop),
            entry("ccm", DeviceTarget::Board(DeviceVariant::F7CoreComputeV2)),
        ]
        .into_iter()
        .collect();

        let platform = PlatformKind::TargetHardware(HardwareRevision::F7CoreComputeV2);
        let (chosen, warning) = registry.resolve(platform, Resolver::default()).unwrap();
        assert_eq!(chosen.name(), "ccm");
        assert!(warning.is_none());

        let (chosen, _) = registry
            .resolve(PlatformKind::DesktopLinux, Resolver::default())
            .unwrap();
        assert_eq!(chosen.target(), DeviceTarget::Desktop);
    }

    #[test]
    fn empty_registry_never_resolves() {
        let registry = AppRegistry::new();
        assert!(registry.is_empty());
        let err = registry
            .resolve(PlatformKind::Windows, Resolver::default())
            .unwrap_err();
        assert_eq!(err.as_label(), "resolve_no_match");
    }
}

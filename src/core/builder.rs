use std::sync::Arc;

use crate::core::config::SupervisorConfig;
use crate::core::supervisor::Supervisor;
use crate::device::App;
use crate::platform::{HostProbe, PlatformProbe};
use crate::registry::AppRegistry;
use crate::settings::Settings;
use crate::subscribers::Subscribe;

/// Builder for a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    registry: AppRegistry,
    probe: Arc<dyn PlatformProbe>,
    settings: Option<Settings>,
    app: Option<Arc<dyn App>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    console_log: bool,
}

impl SupervisorBuilder {
    /// Host probe, empty registry, settings from the settings file, console log on.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            registry: AppRegistry::new(),
            probe: Arc::new(HostProbe::new()),
            settings: None,
            app: None,
            subscribers: Vec::new(),
            console_log: true,
        }
    }

    /// Applications to choose from.
    pub fn with_registry(mut self, registry: AppRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Event subscribers; each gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the host probe used for platform detection.
    pub fn with_probe(mut self, probe: Arc<dyn PlatformProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Uses these settings instead of reading the settings file.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Hosts this instance instead of calling the resolved entry's app factory.
    pub fn with_app(mut self, app: Arc<dyn App>) -> Self {
        self.app = Some(app);
        self
    }

    /// Adds the built-in `LogWriter` (feature `logging`), filtered by the
    /// logging settings.
    pub fn with_console_log(mut self, enabled: bool) -> Self {
        self.console_log = enabled;
        self
    }

    pub fn build(self) -> Supervisor {
        Supervisor::new_internal(
            self.cfg,
            self.registry,
            self.probe,
            self.settings,
            self.app,
            self.subscribers,
            self.console_log,
        )
    }
}

//! Method routing for command dispatch.
//!
//! A method is split on its first `.`; the prefix selects one of the daemon's
//! domains and the remainder is the command handed to that domain. Unknown
//! prefixes are rejected before any handler runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::DISPATCH_TARGET;
use super::domain::Domain;
use super::errors::DispatchError;

/// Known command domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainName {
    /// Daemon lifecycle and log forwarding.
    Daemon,
    /// Application launch and teardown.
    App,
    /// Device discovery.
    Device,
}

impl DomainName {
    /// Every domain the daemon registers.
    pub const ALL: [Self; 3] = [Self::Daemon, Self::App, Self::Device];

    /// Parses a method prefix. Matching is exact.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daemon" => Some(Self::Daemon),
            "app" => Some(Self::App),
            "device" => Some(Self::Device),
            _ => None,
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daemon => "daemon",
            Self::App => "app",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Routing table from domain name to domain.
#[derive(Debug, Default)]
pub struct DomainRouter {
    domains: HashMap<DomainName, Arc<Domain>>,
}

impl DomainRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `domain` under its own name, replacing any earlier entry.
    pub fn register(&mut self, domain: Domain) {
        self.domains.insert(domain.name(), Arc::new(domain));
    }

    /// Resolves `method` to its domain and command.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MethodNotUnderstood`] when the method has no
    /// `.` separator and [`DispatchError::UnknownDomain`] when the prefix names
    /// no registered domain.
    pub fn resolve<'a>(&self, method: &'a str) -> Result<(Arc<Domain>, &'a str), DispatchError> {
        let Some((prefix, command)) = method.split_once('.') else {
            return Err(DispatchError::method_not_understood(method));
        };
        let domain = DomainName::parse(prefix)
            .and_then(|name| self.domains.get(&name))
            .ok_or_else(|| DispatchError::unknown_domain(method))?;

        debug!(
            target: DISPATCH_TARGET,
            domain = prefix,
            command,
            "routing command"
        );
        Ok((Arc::clone(domain), command))
    }

    /// Fully qualified methods served by the registered domains, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self
            .domains
            .values()
            .flat_map(|domain| {
                domain
                    .commands()
                    .into_iter()
                    .map(move |command| format!("{}.{command}", domain.name()))
            })
            .collect();
        methods.sort_unstable();
        methods
    }

    /// Disposes every registered domain.
    pub fn dispose_all(&self) {
        for name in DomainName::ALL {
            if let Some(domain) = self.domains.get(&name) {
                domain.dispose();
            }
        }
    }
}

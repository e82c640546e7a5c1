//! # App/device resolver.
//!
//! Picks exactly one application candidate for the detected platform from a
//! static list of [`AppDescriptor`]s.
//!
//! ## Compatibility table
//! ```text
//! Windows          → Desktop ≻ Windows
//! MacOs            → Desktop ≻ Mac
//! DesktopLinux     → Desktop ≻ Linux
//! EmbeddedLinux    → RaspberryPi | JetsonNano | JetsonXavierAgx | SnickerdoodleBlack
//! Target(revision) → Board(variant of revision)           exact match
//! Target(Unknown)  → first Board(_) candidate             warning if several candidates
//! Unknown          → nothing
//! ```
//! `≻` means "preferred over"; among candidates of equal rank the first
//! registered one wins.

use std::borrow::Cow;
use std::fmt;

use crate::error::ResolveError;
use crate::hardware::DeviceVariant;

use super::detect::{HardwareRevision, PlatformKind};

/// Device type an application declares as its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceTarget {
    /// Any desktop OS.
    Desktop,
    Windows,
    Mac,
    Linux,
    RaspberryPi,
    JetsonNano,
    JetsonXavierAgx,
    SnickerdoodleBlack,
    /// A dedicated target board.
    Board(DeviceVariant),
}

impl DeviceTarget {
    /// Embedded Linux boards accepted on [`PlatformKind::EmbeddedLinux`].
    pub const EMBEDDED_LINUX: [DeviceTarget; 4] = [
        DeviceTarget::RaspberryPi,
        DeviceTarget::JetsonNano,
        DeviceTarget::JetsonXavierAgx,
        DeviceTarget::SnickerdoodleBlack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceTarget::Desktop => "desktop",
            DeviceTarget::Windows => "windows",
            DeviceTarget::Mac => "mac",
            DeviceTarget::Linux => "linux",
            DeviceTarget::RaspberryPi => "raspberry_pi",
            DeviceTarget::JetsonNano => "jetson_nano",
            DeviceTarget::JetsonXavierAgx => "jetson_xavier_agx",
            DeviceTarget::SnickerdoodleBlack => "snickerdoodle_black",
            DeviceTarget::Board(v) => v.as_str(),
        }
    }

    /// Rank of this target on `platform`: `None` if incompatible, lower is better.
    fn rank(self, platform: PlatformKind) -> Option<u8> {
        use DeviceTarget as T;
        use PlatformKind as P;

        match (platform, self) {
            (P::Windows | P::MacOs | P::DesktopLinux, T::Desktop) => Some(0),
            (P::Windows, T::Windows) | (P::MacOs, T::Mac) | (P::DesktopLinux, T::Linux) => {
                Some(1)
            }
            (P::EmbeddedLinux, t) if Self::EMBEDDED_LINUX.contains(&t) => Some(0),
            (P::TargetHardware(HardwareRevision::Unknown), T::Board(_)) => Some(0),
            (P::TargetHardware(rev), T::Board(v)) if rev.variant() == Some(v) => Some(0),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application candidate: a name and the device type it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDescriptor {
    pub name: Cow<'static, str>,
    pub target: DeviceTarget,
}

impl AppDescriptor {
    pub fn new(name: impl Into<Cow<'static, str>>, target: DeviceTarget) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// Non-fatal condition the caller is expected to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveWarning {
    /// Hardware revision unknown; the first of `candidates` apps was picked.
    AmbiguousTarget { candidates: usize },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::AmbiguousTarget { candidates } => write!(
                f,
                "hardware revision unknown; using the first of {candidates} applications"
            ),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Position of the chosen candidate in the input list.
    pub index: usize,
    pub descriptor: &'a AppDescriptor,
    pub warning: Option<ResolveWarning>,
}

/// Resolver with its strictness setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    /// Fail with [`ResolveError::Ambiguous`] instead of warning.
    pub strict: bool,
}

impl Resolver {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn resolve<'a>(
        &self,
        platform: PlatformKind,
        candidates: &'a [AppDescriptor],
    ) -> Result<Resolution<'a>, ResolveError> {
        let best = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.target.rank(platform).map(|r| (r, i, d)))
            .min_by_key(|(rank, i, _)| (*rank, *i));

        let Some((_, index, descriptor)) = best else {
            return Err(ResolveError::NoMatch { platform });
        };

        let mut warning = None;
        if platform == PlatformKind::TargetHardware(HardwareRevision::Unknown)
            && candidates.len() > 1
        {
            if self.strict {
                return Err(ResolveError::Ambiguous {
                    platform,
                    candidates: candidates.len(),
                });
            }
            warning = Some(ResolveWarning::AmbiguousTarget {
                candidates: candidates.len(),
            });
        }

        Ok(Resolution {
            index,
            descriptor,
            warning,
        })
    }
}

/// Resolves with the default (warn-and-proceed) resolver.
pub fn resolve(
    platform: PlatformKind,
    candidates: &[AppDescriptor],
) -> Result<Resolution<'_>, ResolveError> {
    Resolver::default().resolve(platform, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &'static str, target: DeviceTarget) -> AppDescriptor {
        AppDescriptor::new(name, target)
    }

    #[test]
    fn embedded_linux_picks_the_single_board_app() {
        let apps = [
            app("desk", DeviceTarget::Desktop),
            app("pi", DeviceTarget::RaspberryPi),
            app("feather", DeviceTarget::Board(DeviceVariant::F7FeatherV2)),
        ];
        let r = resolve(PlatformKind::EmbeddedLinux, &apps).unwrap();
        assert_eq!(r.descriptor.name, "pi");
        assert_eq!(r.index, 1);
        assert_eq!(r.warning, None);
    }

    #[test]
    fn every_embedded_board_is_accepted() {
        for target in DeviceTarget::EMBEDDED_LINUX {
            let apps = [app("only", target)];
            assert!(resolve(PlatformKind::EmbeddedLinux, &apps).is_ok(), "{target}");
        }
    }

    #[test]
    fn empty_or_incompatible_lists_fail() {
        let err = resolve(PlatformKind::EmbeddedLinux, &[]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NoMatch {
                platform: PlatformKind::EmbeddedLinux
            }
        );

        let apps = [app("win", DeviceTarget::Windows), app("mac", DeviceTarget::Mac)];
        assert!(matches!(
            resolve(PlatformKind::EmbeddedLinux, &apps),
            Err(ResolveError::NoMatch { .. })
        ));
        assert!(matches!(
            resolve(PlatformKind::Unknown, &apps),
            Err(ResolveError::NoMatch { .. })
        ));
    }

    #[test]
    fn desktop_is_preferred_over_os_specific() {
        let apps = [app("win", DeviceTarget::Windows), app("desk", DeviceTarget::Desktop)];
        let r = resolve(PlatformKind::Windows, &apps).unwrap();
        assert_eq!(r.descriptor.name, "desk");

        let only_linux = [app("lin", DeviceTarget::Linux)];
        let r = resolve(PlatformKind::DesktopLinux, &only_linux).unwrap();
        assert_eq!(r.descriptor.name, "lin");
        assert!(resolve(PlatformKind::MacOs, &only_linux).is_err());
    }

    #[test]
    fn known_revision_requires_exact_board() {
        let apps = [
            app("v1", DeviceTarget::Board(DeviceVariant::F7FeatherV1)),
            app("ccm", DeviceTarget::Board(DeviceVariant::F7CoreComputeV2)),
        ];
        let platform = PlatformKind::TargetHardware(HardwareRevision::F7CoreComputeV2);
        let r = resolve(platform, &apps).unwrap();
        assert_eq!(r.descriptor.name, "ccm");
        assert_eq!(r.warning, None);

        let platform = PlatformKind::TargetHardware(HardwareRevision::F7FeatherV2);
        assert!(matches!(
            resolve(platform, &apps),
            Err(ResolveError::NoMatch { .. })
        ));
    }

    #[test]
    fn unknown_revision_takes_first_board_with_warning() {
        let apps = [
            app("v2", DeviceTarget::Board(DeviceVariant::F7FeatherV2)),
            app("v1", DeviceTarget::Board(DeviceVariant::F7FeatherV1)),
        ];
        let platform = PlatformKind::TargetHardware(HardwareRevision::Unknown);

        let r = resolve(platform, &apps).unwrap();
        assert_eq!(r.descriptor.name, "v2");
        assert_eq!(
            r.warning,
            Some(ResolveWarning::AmbiguousTarget { candidates: 2 })
        );

        let err = Resolver::new(true).resolve(platform, &apps).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Ambiguous {
                platform,
                candidates: 2
            }
        );

        let single = [app("v1", DeviceTarget::Board(DeviceVariant::F7FeatherV1))];
        let r = Resolver::new(true).resolve(platform, &single).unwrap();
        assert_eq!(r.warning, None);
    }
}

//! # Platform detection.
//!
//! [`detect`] classifies the running environment into one [`PlatformKind`].
//! It never mutates anything; all OS facts come from a [`PlatformProbe`] so
//! detection can be exercised without the hardware.
//!
//! ## Rules
//! ```text
//! os == "windows"                     → Windows
//! os == "macos"                       → MacOs
//! os == "linux" && arch ∈ {arm, aarch64} → EmbeddedLinux
//! os == "linux"                       → DesktopLinux
//! target marker present               → TargetHardware(revision)
//!     revision query fails            → TargetHardware(Unknown)
//! otherwise                           → Unknown
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::hardware::DeviceVariant;

/// Directory that only exists on the dedicated target hardware.
pub const TARGET_MARKER_DIR: &str = "/target0";
/// File under the marker directory holding the numeric hardware revision.
pub const HARDWARE_REVISION_FILE: &str = "hw_version";

/// Hardware revision reported by the target firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareRevision {
    /// Firmware too old to report it, or an unrecognized code.
    Unknown,
    F7FeatherV1,
    F7FeatherV2,
    F7CoreComputeV2,
}

impl HardwareRevision {
    /// Decodes the firmware revision code.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => HardwareRevision::F7FeatherV1,
            2 => HardwareRevision::F7FeatherV2,
            3 => HardwareRevision::F7CoreComputeV2,
            _ => HardwareRevision::Unknown,
        }
    }

    /// Pin-table variant of this revision.
    pub fn variant(self) -> Option<DeviceVariant> {
        match self {
            HardwareRevision::Unknown => None,
            HardwareRevision::F7FeatherV1 => Some(DeviceVariant::F7FeatherV1),
            HardwareRevision::F7FeatherV2 => Some(DeviceVariant::F7FeatherV2),
            HardwareRevision::F7CoreComputeV2 => Some(DeviceVariant::F7CoreComputeV2),
        }
    }
}

/// Platform category of the running environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Windows,
    MacOs,
    DesktopLinux,
    EmbeddedLinux,
    TargetHardware(HardwareRevision),
    Unknown,
}

impl PlatformKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            PlatformKind::Windows => "windows",
            PlatformKind::MacOs => "macos",
            PlatformKind::DesktopLinux => "desktop_linux",
            PlatformKind::EmbeddedLinux => "embedded_linux",
            PlatformKind::TargetHardware(HardwareRevision::Unknown) => "target_hardware",
            PlatformKind::TargetHardware(HardwareRevision::F7FeatherV1) => "target_f7_feather_v1",
            PlatformKind::TargetHardware(HardwareRevision::F7FeatherV2) => "target_f7_feather_v2",
            PlatformKind::TargetHardware(HardwareRevision::F7CoreComputeV2) => {
                "target_f7_core_compute_v2"
            }
            PlatformKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Source of the OS facts used by [`detect`].
pub trait PlatformProbe: Send + Sync {
    /// OS family, as in [`std::env::consts::OS`].
    fn os(&self) -> &str;

    /// Processor architecture, as in [`std::env::consts::ARCH`].
    fn arch(&self) -> &str;

    /// Whether the dedicated target hardware marker is present.
    fn is_target_hardware(&self) -> bool;

    /// Native hardware revision query; may fail on older firmware.
    fn hardware_revision(&self) -> io::Result<u32>;
}

/// Probe backed by the running host.
#[derive(Debug, Clone)]
pub struct HostProbe {
    marker: PathBuf,
}

impl HostProbe {
    pub fn new() -> Self {
        Self {
            marker: PathBuf::from(TARGET_MARKER_DIR),
        }
    }

    /// Uses a different marker directory (tests, custom images).
    pub fn with_marker(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for HostProbe {
    fn os(&self) -> &str {
        std::env::consts::OS
    }

    fn arch(&self) -> &str {
        std::env::consts::ARCH
    }

    fn is_target_hardware(&self) -> bool {
        self.marker.is_dir()
    }

    fn hardware_revision(&self) -> io::Result<u32> {
        let raw = std::fs::read_to_string(self.marker.join(HARDWARE_REVISION_FILE))?;
        raw.trim()
            .parse::<u32>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Classifies the running environment.
pub fn detect(probe: &dyn PlatformProbe) -> PlatformKind {
    match probe.os() {
        "windows" => PlatformKind::Windows,
        "macos" => PlatformKind::MacOs,
        "linux" => match probe.arch() {
            "arm" | "aarch64" => PlatformKind::EmbeddedLinux,
            _ => PlatformKind::DesktopLinux,
        },
        _ if probe.is_target_hardware() => {
            let revision = probe
                .hardware_revision()
                .map(HardwareRevision::from_code)
                .unwrap_or(HardwareRevision::Unknown);
            PlatformKind::TargetHardware(revision)
        }
        _ => PlatformKind::Unknown,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct FakeProbe {
        pub os: &'static str,
        pub arch: &'static str,
        pub marker: bool,
        pub revision: Option<u32>,
    }

    impl PlatformProbe for FakeProbe {
        fn os(&self) -> &str {
            self.os
        }
        fn arch(&self) -> &str {
            self.arch
        }
        fn is_target_hardware(&self) -> bool {
            self.marker
        }
        fn hardware_revision(&self) -> io::Result<u32> {
            self.revision
                .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "no revision query"))
        }
    }

    fn probe(os: &'static str, arch: &'static str) -> FakeProbe {
        FakeProbe {
            os,
            arch,
            marker: false,
            revision: None,
        }
    }

    #[test]
    fn desktop_families() {
        assert_eq!(detect(&probe("windows", "x86_64")), PlatformKind::Windows);
        assert_eq!(detect(&probe("macos", "aarch64")), PlatformKind::MacOs);
        assert_eq!(detect(&probe("linux", "x86_64")), PlatformKind::DesktopLinux);
    }

    #[test]
    fn arm_linux_is_embedded() {
        assert_eq!(detect(&probe("linux", "arm")), PlatformKind::EmbeddedLinux);
        assert_eq!(detect(&probe("linux", "aarch64")), PlatformKind::EmbeddedLinux);
    }

    #[test]
    fn target_hardware_reads_revision() {
        let p = FakeProbe {
            os: "none",
            arch: "arm",
            marker: true,
            revision: Some(3),
        };
        assert_eq!(
            detect(&p),
            PlatformKind::TargetHardware(HardwareRevision::F7CoreComputeV2)
        );
    }

    #[test]
    fn failed_revision_query_degrades_to_generic_target() {
        let p = FakeProbe {
            os: "none",
            arch: "arm",
            marker: true,
            revision: None,
        };
        assert_eq!(
            detect(&p),
            PlatformKind::TargetHardware(HardwareRevision::Unknown)
        );

        let odd = FakeProbe {
            revision: Some(42),
            ..p
        };
        assert_eq!(
            detect(&odd),
            PlatformKind::TargetHardware(HardwareRevision::Unknown)
        );
    }

    #[test]
    fn nothing_recognized_is_unknown() {
        assert_eq!(detect(&probe("freebsd", "x86_64")), PlatformKind::Unknown);
    }

    #[test]
    fn host_probe_reads_marker_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(HARDWARE_REVISION_FILE), "2\n").unwrap();

        let probe = HostProbe::with_marker(dir.path());
        assert!(probe.is_target_hardware());
        assert_eq!(probe.hardware_revision().unwrap(), 2);

        let missing = HostProbe::with_marker(dir.path().join("nope"));
        assert!(!missing.is_target_hardware());
        assert!(missing.hardware_revision().is_err());
    }
}

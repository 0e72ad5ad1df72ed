//! Bridge configuration.
//!
//! Where the kernel comes from, which entry point to run, and which wgpu
//! backends may be used for device discovery. Nothing here is hardcoded into
//! the dispatch logic: callers pass a [`BridgeConfig`] explicitly, or use
//! [`BridgeConfig::from_env`] at the FFI boundary.
//!
//! ## Environment
//!
//! | Variable               | Effect                                   |
//! |------------------------|------------------------------------------|
//! | `MATMUL_BRIDGE_KERNEL` | Path to a `.wgsl` or `.spv` kernel file   |
//! | `MATMUL_BRIDGE_ENTRY`  | Compute entry point name                 |
//! | `WGPU_BACKEND`         | Backend list, e.g. `vulkan,metal`        |

use std::fmt;
use std::path::PathBuf;

/// Environment variable naming a kernel file.
pub const KERNEL_PATH_ENV: &str = "MATMUL_BRIDGE_KERNEL";

/// Environment variable naming the compute entry point.
pub const ENTRY_POINT_ENV: &str = "MATMUL_BRIDGE_ENTRY";

/// Entry point used when none is configured.
pub const DEFAULT_ENTRY_POINT: &str = "matmul";

/// Reference kernel compiled into the library.
pub const EMBEDDED_KERNEL_WGSL: &str = include_str!("../../kernels/matmul.wgsl");

/// Location of the kernel module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelSource {
    /// The reference WGSL kernel shipped with the crate.
    Embedded,
    /// A kernel file on disk. `.spv` is read as SPIR-V, anything else as WGSL.
    Path(PathBuf),
}

impl fmt::Display for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelSource::Embedded => f.write_str("<embedded>"),
            KernelSource::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Configuration for one or more matmul calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Kernel module location.
    pub kernel: KernelSource,
    /// Name of the compute entry point inside the kernel module.
    pub entry_point: String,
    /// Backends considered during device discovery.
    pub backends: wgpu::Backends,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            kernel: KernelSource::Embedded,
            entry_point: DEFAULT_ENTRY_POINT.to_owned(),
            backends: wgpu::Backends::all(),
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
            .with_backends(wgpu::Backends::from_env().unwrap_or(wgpu::Backends::all()))
    }

    /// Builds a config from an arbitrary key lookup. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(KERNEL_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.kernel = KernelSource::Path(PathBuf::from(path));
        }
        if let Some(entry) = lookup(ENTRY_POINT_ENV).filter(|v| !v.trim().is_empty()) {
            config.entry_point = entry.trim().to_owned();
        }
        config
    }

    /// Uses a kernel file instead of the embedded kernel.
    pub fn with_kernel_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kernel = KernelSource::Path(path.into());
        self
    }

    /// Sets the entry point name.
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Restricts device discovery to `backends`.
    ///
    /// An empty set makes discovery find nothing, which is how callers can
    /// exercise the no-device path.
    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }
}

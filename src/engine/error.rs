//! Error types for the matmul dispatch pipeline.
//!
//! Every stage of a call (device resolution, kernel loading, pipeline
//! compilation, buffer staging, dispatch and synchronization) reports failure
//! through a single aggregate error, [`BridgeError`]. Each variant maps to one
//! terminal failure mode: nothing is retried and nothing is recovered
//! internally.
//!
//! ## Goals
//! * **Explicit:** failures are returned to the caller, never only logged.
//! * **Actionable:** variants carry the offending path, entry point or byte
//!   length so a log line is enough to diagnose the problem.
//! * **FFI-friendly:** every error maps onto a stable numeric
//!   [`MatmulStatus`] for C callers.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is short and suitable for operator logs.
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::borrow::Cow;
use std::fmt;

/// Result alias used throughout the crate.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Aggregate error for one matmul call.
///
/// ### Example
/// ```ignore
/// match matmul_bridge::run_matmul(&config, &a, &b, &mut c, size) {
///     Ok(report) => println!("gpu time {:.3} ms", report.elapsed_ms),
///     Err(BridgeError::NoDeviceFound) => eprintln!("no GPU; falling back to CPU"),
///     Err(e) => eprintln!("matmul failed: {e}"),
/// }
/// ```

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {

    /// The adapter list was empty for the configured backends.
    NoDeviceFound,

    /// An adapter was found but opening a logical device on it failed.
    DeviceRequestFailed {
        /// Adapter that refused the request.
        adapter: String,

        /// Driver or wgpu message.
        message: Cow<'static, str>,
    },

    /// The kernel artifact could not be read or parsed.
    ModuleLoadFailed {
        /// Where the kernel was loaded from (file path or `<embedded>`).
        origin: String,

        /// Underlying I/O or parse error.
        message: Cow<'static, str>,
    },

    /// The kernel module has no compute entry point with the requested name.
    EntryPointNotFound {
        /// Name that was looked up.
        entry_point: String,

        /// Where the kernel was loaded from.
        origin: String,
    },

    /// The device rejected the compute pipeline.
    PipelineCompilationFailed {
        /// Validation message reported by wgpu.
        message: Cow<'static, str>,
    },

    /// One of the staged buffers could not be allocated.
    BufferAllocationFailed {
        /// Byte length that was requested per matrix buffer.
        bytes: u64,

        /// Limit or allocation error that caused the failure.
        message: Cow<'static, str>,
    },

    /// Submission, synchronization or readback failed.
    DispatchFailed {
        /// wgpu poll or map error.
        message: Cow<'static, str>,
    },

    /// The requested size is zero, or too large for 32-bit kernel indexing.
    InvalidSize {
        /// Offending size.
        size: u64,
    },

    /// A required host pointer was null.
    NullPointer {
        /// Which argument was null.
        which: &'static str,
    },

    /// A host matrix slice does not hold exactly `size * size` elements.
    LengthMismatch {
        /// Which matrix (`"a"`, `"b"` or `"c"`).
        which: &'static str,

        /// `size * size`.
        expected: usize,

        /// Actual slice length.
        actual: usize,
    },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::NoDeviceFound => f.write_str("no compatible GPU found"),
            BridgeError::DeviceRequestFailed { adapter, message } => {
                write!(f, "failed to open device on adapter '{adapter}': {message}")
            }
            BridgeError::ModuleLoadFailed { origin, message } => {
                write!(f, "failed to load kernel module from {origin}: {message}")
            }
            BridgeError::EntryPointNotFound { entry_point, origin } => {
                write!(f, "compute entry point '{entry_point}' not found in {origin}")
            }
            BridgeError::PipelineCompilationFailed { message } => {
                write!(f, "failed to create compute pipeline: {message}")
            }
            BridgeError::BufferAllocationFailed { bytes, message } => {
                write!(f, "failed to allocate {bytes}-byte device buffers: {message}")
            }
            BridgeError::DispatchFailed { message } => {
                write!(f, "gpu dispatch failed: {message}")
            }
            BridgeError::InvalidSize { size } => {
                write!(f, "invalid matrix size {size} (must be in 1..=u32::MAX and fit in device memory)")
            }
            BridgeError::NullPointer { which } => write!(f, "null pointer passed for '{which}'"),
            BridgeError::LengthMismatch { which, expected, actual } => write!(
                f,
                "matrix '{which}' has {actual} elements, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Numeric status returned by the C entry points.
///
/// Values are stable; new variants are only ever appended.

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatmulStatus {
    /// Output written, timing recorded.
    Ok = 0,
    /// See [`BridgeError::NoDeviceFound`].
    NoDeviceFound = 1,
    /// See [`BridgeError::ModuleLoadFailed`].
    ModuleLoadFailed = 2,
    /// See [`BridgeError::EntryPointNotFound`].
    EntryPointNotFound = 3,
    /// See [`BridgeError::PipelineCompilationFailed`].
    PipelineCompilationFailed = 4,
    /// See [`BridgeError::BufferAllocationFailed`].
    BufferAllocationFailed = 5,
    /// See [`BridgeError::DispatchFailed`].
    DispatchFailed = 6,
    /// [`BridgeError::InvalidSize`], [`BridgeError::NullPointer`] or
    /// [`BridgeError::LengthMismatch`].
    InvalidArgument = 7,
    /// See [`BridgeError::DeviceRequestFailed`].
    DeviceRequestFailed = 8,
    /// A panic was caught at the FFI boundary.
    Internal = 9,
}

impl From<&BridgeError> for MatmulStatus {
    fn from(e: &BridgeError) -> Self {
        match e {
            BridgeError::NoDeviceFound => MatmulStatus::NoDeviceFound,
            BridgeError::DeviceRequestFailed { .. } => MatmulStatus::DeviceRequestFailed,
            BridgeError::ModuleLoadFailed { .. } => MatmulStatus::ModuleLoadFailed,
            BridgeError::EntryPointNotFound { .. } => MatmulStatus::EntryPointNotFound,
            BridgeError::PipelineCompilationFailed { .. } => MatmulStatus::PipelineCompilationFailed,
            BridgeError::BufferAllocationFailed { .. } => MatmulStatus::BufferAllocationFailed,
            BridgeError::DispatchFailed { .. } => MatmulStatus::DispatchFailed,
            BridgeError::InvalidSize { .. }
            | BridgeError::NullPointer { .. }
            | BridgeError::LengthMismatch { .. } => {
                MatmulStatus::InvalidArgument
            }
        }
    }
}

impl<T> From<&BridgeResult<T>> for MatmulStatus {
    fn from(r: &BridgeResult<T>) -> Self {
        match r {
            Ok(_) => MatmulStatus::Ok,
            Err(e) => MatmulStatus::from(e),
        }
    }
}

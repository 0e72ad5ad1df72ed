//! Core types shared by the host side and the GPU backend.
//!
//! This module defines the **shapes and scalars** every call works with:
//!
//! - [`Extent3`]: a 3-D extent in work items,
//! - [`WorkGrid`]: the grid/tile pair a dispatch is launched with,
//! - [`MatmulParams`]: the uniform block carrying the matrix size,
//! - [`CallState`]: the per-call stage machine used for logging.
//!
//! ## Work grid
//!
//! A square `size × size` multiply is launched as one work item per output
//! element:
//!
//! ```text
//! grid = (size, size, 1)
//! tile = (min(16, size), min(16, size), 1)
//! workgroups = (ceil(size / tile.x), ceil(size / tile.y), 1)
//! ```
//!
//! When `size` is not a multiple of the tile the workgroup count rounds up and
//! the grid is over-covered; the kernel discards work items outside `size`.
//!
//! ## Size scalar
//!
//! The size is always passed to the kernel as a 32-bit unsigned integer,
//! independent of the host word width.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::engine::error::{BridgeError, BridgeResult};

/// Maximum tile edge used for square dispatches.
pub const MAX_TILE_EDGE: u32 = 16;

/// Size of one matrix element in bytes.
pub const ELEMENT_BYTES: u64 = std::mem::size_of::<f32>() as u64;

/// A 3-D extent (work items or workgroup counts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3 {
    /// Extent along x (columns).
    pub x: u32,
    /// Extent along y (rows).
    pub y: u32,
    /// Extent along z; always 1 for matmul.
    pub z: u32,
}

impl Extent3 {
    /// Creates an extent.
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Total number of items covered.
    #[inline]
    pub fn volume(self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    /// Returns `true` if `self` is no larger than `other` on every axis.
    #[inline]
    pub fn fits_within(self, other: Extent3) -> bool {
        self.x <= other.x && self.y <= other.y && self.z <= other.z
    }
}

impl fmt::Display for Extent3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}×{}", self.x, self.y, self.z)
    }
}

/// Grid and tile extents for one dispatch.
///
/// ## Invariants
/// * `grid == (size, size, 1)`
/// * `tile` never exceeds `grid` on any axis
/// * every axis of `tile` is at least 1

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGrid {
    /// Total work items: one per output element.
    pub grid: Extent3,
    /// Work items per workgroup.
    pub tile: Extent3,
}

impl WorkGrid {
    /// Computes the default grid for a square matrix of edge `size`.
    ///
    /// The tile is `min(16, size)` on x and y.
    pub fn for_size(size: u32) -> BridgeResult<Self> {
        let edge = size.min(MAX_TILE_EDGE);
        Self::with_tile(size, Extent3::new(edge, edge, 1))
    }

    /// Computes the grid for a kernel with a fixed workgroup shape.
    ///
    /// The tile is clamped to the grid so the invariant holds for tiny sizes.
    pub fn with_tile(size: u32, tile: Extent3) -> BridgeResult<Self> {
        if size == 0 {
            return Err(BridgeError::InvalidSize { size: 0 });
        }
        let grid = Extent3::new(size, size, 1);
        let tile = Extent3::new(
            tile.x.clamp(1, grid.x),
            tile.y.clamp(1, grid.y),
            tile.z.clamp(1, grid.z),
        );
        Ok(Self { grid, tile })
    }

    /// Number of workgroups to dispatch on each axis.
    #[inline]
    pub fn workgroups(&self) -> Extent3 {
        Extent3::new(
            self.grid.x.div_ceil(self.tile.x),
            self.grid.y.div_ceil(self.tile.y),
            self.grid.z.div_ceil(self.tile.z),
        )
    }

    /// Returns `true` if the workgroups cover the grid exactly.
    #[inline]
    pub fn is_tile_aligned(&self) -> bool {
        self.grid.x % self.tile.x == 0 && self.grid.y % self.tile.y == 0
    }
}

impl fmt::Display for WorkGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid[{}] tile[{}] groups[{}]", self.grid, self.tile, self.workgroups())
    }
}

/// Uniform block bound at slot 3.
///
/// Padded to 16 bytes to satisfy uniform buffer layout rules.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MatmulParams {
    /// Matrix edge length.
    pub size: u32,
    _p0: u32,
    _p1: u32,
    _p2: u32,
}

impl MatmulParams {
    /// Params for a matrix of edge `size`.
    pub fn new(size: u32) -> Self {
        Self { size, _p0: 0, _p1: 0, _p2: 0 }
    }
}

/// Validates a host-supplied size and converts it to the kernel's `u32`.
///
/// Rejects zero, sizes that do not fit `u32`, and sizes whose per-matrix byte
/// length overflows `u64`.
pub fn checked_size(size: u64) -> BridgeResult<u32> {
    let edge = u32::try_from(size).map_err(|_| BridgeError::InvalidSize { size })?;
    if edge == 0 {
        return Err(BridgeError::InvalidSize { size });
    }
    matrix_bytes(edge)?;
    Ok(edge)
}

/// Byte length of one `size × size` f32 matrix.
pub fn matrix_bytes(size: u32) -> BridgeResult<u64> {
    (size as u64)
        .checked_mul(size as u64)
        .and_then(|n| n.checked_mul(ELEMENT_BYTES))
        .ok_or(BridgeError::InvalidSize { size: size as u64 })
}

/// Number of elements in one `size × size` matrix.
#[inline]
pub fn matrix_len(size: u32) -> usize {
    size as usize * size as usize
}

/// Stage reached by a call.
///
/// ```text
/// Idle → DeviceResolved → ModuleLoaded → PipelineBuilt
///      → BuffersStaged → Dispatched → Synchronized
/// ```
/// Any failure moves the call to `Aborted`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Nothing done yet.
    Idle,
    /// Adapter selected and device opened.
    DeviceResolved,
    /// Kernel parsed and entry point resolved.
    ModuleLoaded,
    /// Compute pipeline created.
    PipelineBuilt,
    /// Input, output and parameter buffers allocated.
    BuffersStaged,
    /// Commands submitted.
    Dispatched,
    /// Device finished and output copied to the host.
    Synchronized,
    /// A stage failed.
    Aborted,
}

impl CallState {
    /// The state that follows `self` on success.
    pub fn next(self) -> CallState {
        match self {
            CallState::Idle => CallState::DeviceResolved,
            CallState::DeviceResolved => CallState::ModuleLoaded,
            CallState::ModuleLoaded => CallState::PipelineBuilt,
            CallState::PipelineBuilt => CallState::BuffersStaged,
            CallState::BuffersStaged => CallState::Dispatched,
            CallState::Dispatched => CallState::Synchronized,
            CallState::Synchronized => CallState::Synchronized,
            CallState::Aborted => CallState::Aborted,
        }
    }

    /// Whether the call has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Synchronized | CallState::Aborted)
    }
}

//! Device buffers for one matmul call.
//!
//! Five buffers are staged per call:
//!
//! | Buffer   | Slot | Usage                          | Contents                 |
//! |----------|------|--------------------------------|--------------------------|
//! | A        | 0    | `STORAGE`                      | copied from host         |
//! | B        | 1    | `STORAGE`                      | copied from host         |
//! | C        | 2    | `STORAGE \| COPY_SRC`          | uninitialized            |
//! | params   | 3    | `UNIFORM`                      | [`MatmulParams`]         |
//! | readback | -    | `MAP_READ \| COPY_DST`         | copy of C after dispatch |
//!
//! A, B, C and readback all have the same byte length, `size * size * 4`.

use wgpu::util::DeviceExt;

use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::types::{matrix_bytes, matrix_len, MatmulParams};
use crate::gpu::context::GPUContext;

/// Buffers bound to a single dispatch.
#[derive(Debug)]
pub struct StagedBuffers {
    /// Matrix A (slot 0).
    pub a: wgpu::Buffer,
    /// Matrix B (slot 1).
    pub b: wgpu::Buffer,
    /// Output matrix C (slot 2).
    pub c: wgpu::Buffer,
    /// Size scalar (slot 3).
    pub params: wgpu::Buffer,
    /// Host-mappable copy target for C.
    pub readback: wgpu::Buffer,
    /// Byte length of each matrix buffer.
    pub bytes: u64,
    /// Matrix edge length.
    pub size: u32,
}

/// Copies `a` and `b` to the device and allocates the output buffers.
///
/// ## Errors
/// * [`BridgeError::LengthMismatch`] if a slice is not `size * size` long
/// * [`BridgeError::BufferAllocationFailed`] if the byte length exceeds the
///   device's limits, or any allocation fails. All five allocations are
///   checked together after they have been issued.

pub fn stage_buffers(
    context: &GPUContext,
    a: &[f32],
    b: &[f32],
    size: u32,
) -> BridgeResult<StagedBuffers> {
    let expected = matrix_len(size);
    for (which, len) in [("a", a.len()), ("b", b.len())] {
        if len != expected {
            return Err(BridgeError::LengthMismatch { which, expected, actual: len });
        }
    }

    let bytes = matrix_bytes(size)?;
    let max = context.max_storage_bytes();
    if bytes > max {
        return Err(BridgeError::BufferAllocationFailed {
            bytes,
            message: format!("exceeds device storage buffer limit of {max} bytes").into(),
        });
    }

    let device = &context.device;
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let input = |label: &'static str, data: &[f32]| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::STORAGE,
        })
    };
    let buffer_a = input("matmul_a", a);
    let buffer_b = input("matmul_b", b);

    let buffer_c = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("matmul_c"),
        size: bytes,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("matmul_params"),
        contents: bytemuck::bytes_of(&MatmulParams::new(size)),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("matmul_readback"),
        size: bytes,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    if let Some(e) = out_of_memory.or(validation) {
        return Err(BridgeError::BufferAllocationFailed { bytes, message: e.to_string().into() });
    }

    tracing::debug!(size, bytes, "device buffers staged");

    Ok(StagedBuffers {
        a: buffer_a,
        b: buffer_b,
        c: buffer_c,
        params,
        readback,
        bytes,
        size,
    })
}

//! # GPU Dispatch Runtime
//!
//! Drives one matmul call through every stage and owns the two steps that
//! touch the queue: dispatch and synchronization.
//!
//! ## High-level execution flow
//!
//! 1. Resolve the first adapter and open a device ([`GPUContext::new`]).
//! 2. Load the kernel and resolve its entry point ([`load_program`]).
//! 3. Build the compute pipeline ([`build_pipeline`]).
//! 4. Stage A, B, C, params and readback buffers ([`stage_buffers`]).
//! 5. Encode the compute pass and the C → readback copy, submit.
//! 6. Block until the device is idle, then copy readback into the host slice.
//!
//! ## Timing
//!
//! The start instant is captured immediately before `Queue::submit`. A
//! completion observer registered with `Queue::on_submitted_work_done` stores
//! the elapsed milliseconds. `Device::poll` with `PollType::Wait` fires pending
//! callbacks before returning, so the value is available once the wait ends.
//!
//! ## Failure model
//!
//! Each stage either advances the [`CallState`] or aborts the call. Nothing is
//! retried, and the host output slice is written only after synchronization
//! succeeds, so a failed call leaves it byte-for-byte untouched.

use std::sync::mpsc;
use std::time::Instant;

use crate::engine::config::BridgeConfig;
use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::timing::ElapsedCell;
use crate::engine::types::{checked_size, matrix_len, CallState, WorkGrid};
use crate::gpu::context::GPUContext;
use crate::gpu::pipeline::{build_pipeline, work_grid_for, MatmulPipeline};
use crate::gpu::program::load_program;
use crate::gpu::resource::{stage_buffers, StagedBuffers};

/// Number of leading output values echoed at debug level.
const PREVIEW_LEN: usize = 10;

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct MatmulReport {
    /// Wall-clock time from submission to completion, in milliseconds.
    pub elapsed_ms: f64,
    /// Name of the adapter the work ran on.
    pub adapter: String,
    /// Backend of that adapter.
    pub backend: wgpu::Backend,
    /// Grid and tile the kernel was dispatched with.
    pub work_grid: WorkGrid,
}

/// Multiplies two `size × size` row-major matrices on the GPU: `out = a * b`.
///
/// `size` is the host's value; it must fit the kernel's 32-bit size scalar.
///
/// ## Errors
/// Any [`BridgeError`]. On error `out` is not modified.

pub fn run_matmul(
    config: &BridgeConfig,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    size: u64,
) -> BridgeResult<MatmulReport> {
    let span = tracing::info_span!("run_matmul", size);
    let _guard = span.enter();

    let mut state = CallState::Idle;
    match run_stages(config, a, b, out, size, &mut state) {
        Ok(report) => {
            tracing::info!(
                elapsed_ms = report.elapsed_ms,
                adapter = %report.adapter,
                work_grid = %report.work_grid,
                "matmul complete"
            );
            Ok(report)
        }
        Err(e) => {
            tracing::error!(failed_after = ?state, error = %e, "matmul aborted");
            Err(e)
        }
    }
}

fn advance(state: &mut CallState) {
    *state = state.next();
    tracing::trace!(state = ?*state, "stage complete");
}

fn run_stages(
    config: &BridgeConfig,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    size: u64,
    state: &mut CallState,
) -> BridgeResult<MatmulReport> {
    let size = checked_size(size)?;
    let expected = matrix_len(size);
    if out.len() != expected {
        return Err(BridgeError::LengthMismatch { which: "c", expected, actual: out.len() });
    }

    let context = GPUContext::new(config.backends)?;
    advance(state);

    let program = load_program(&config.kernel, &config.entry_point)?;
    advance(state);

    let work_grid = work_grid_for(&program, size)?;
    let pipeline = build_pipeline(&context, &program, work_grid)?;
    advance(state);

    let buffers = stage_buffers(&context, a, b, size)?;
    advance(state);

    let commands = encode_dispatch(&context, &pipeline, &buffers)?;
    let elapsed_ms = submit_and_wait(&context, commands)?;
    advance(state);

    read_back(&context, &buffers, out)?;
    advance(state);

    Ok(MatmulReport {
        elapsed_ms,
        adapter: context.adapter_info.name.clone(),
        backend: context.adapter_info.backend,
        work_grid,
    })
}

/// Binds the buffers, records the compute pass and the readback copy.
///
/// ## Binding layout
/// A → 0, B → 1, C → 2, params → 3.
///
/// ## Workgroup sizing
/// `ceil(size / tile)` workgroups on x and y; the kernel discards work items
/// past `size` when the grid is not tile-aligned.

pub fn encode_dispatch(
    context: &GPUContext,
    pipeline: &MatmulPipeline,
    buffers: &StagedBuffers,
) -> BridgeResult<wgpu::CommandBuffer> {
    let device = &context.device;
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("matmul_bind_group"),
        layout: &pipeline.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: buffers.a.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: buffers.b.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 2, resource: buffers.c.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 3, resource: buffers.params.as_entire_binding() },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("matmul_encoder"),
    });

    let groups = pipeline.work_grid.workgroups();
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("matmul_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(groups.x, groups.y, groups.z);
    }

    encoder.copy_buffer_to_buffer(&buffers.c, 0, &buffers.readback, 0, buffers.bytes);
    let commands = encoder.finish();

    if let Some(e) = pollster::block_on(device.pop_error_scope()) {
        return Err(BridgeError::DispatchFailed { message: e.to_string().into() });
    }

    tracing::debug!(workgroups = %groups, work_grid = %pipeline.work_grid, "dispatch encoded");
    Ok(commands)
}

/// Submits `commands` and blocks until the device reports completion.
///
/// Returns the elapsed time recorded by the completion observer. No timeout:
/// a hung device blocks the calling thread.

pub fn submit_and_wait(context: &GPUContext, commands: wgpu::CommandBuffer) -> BridgeResult<f64> {
    let cell = ElapsedCell::new();

    let start = Instant::now();
    let submission = context.queue.submit(Some(commands));

    let observer = cell.clone();
    context.queue.on_submitted_work_done(move || {
        observer.record(start.elapsed().as_secs_f64() * 1000.0);
    });

    context
        .device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .map_err(|e| BridgeError::DispatchFailed {
            message: format!("wgpu device poll failed: {e:?}").into(),
        })?;

    // The observer may lag the wait on some backends; measure here instead
    // of reporting nothing.
    let elapsed_ms = cell.get().unwrap_or_else(|| {
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        cell.record(ms);
        ms
    });

    Ok(elapsed_ms)
}

/// Maps the readback buffer and copies it into `out`.
///
/// `out` is written only after the map succeeded.

pub fn read_back(context: &GPUContext, buffers: &StagedBuffers, out: &mut [f32]) -> BridgeResult<()> {
    let slice = buffers.readback.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    context
        .device
        .poll(wgpu::PollType::Wait { submission_index: None, timeout: None })
        .map_err(|e| BridgeError::DispatchFailed {
            message: format!("wgpu device poll failed: {e:?}").into(),
        })?;

    receiver
        .recv()
        .map_err(|_| BridgeError::DispatchFailed { message: "readback map callback dropped".into() })?
        .map_err(|e| BridgeError::DispatchFailed { message: format!("readback map failed: {e}").into() })?;

    {
        let data = slice.get_mapped_range();
        out.copy_from_slice(bytemuck::cast_slice::<u8, f32>(&data));
    }
    buffers.readback.unmap();

    tracing::debug!(
        size = buffers.size,
        preview = ?&out[..out.len().min(PREVIEW_LEN)],
        "gpu output (first values)"
    );

    Ok(())
}

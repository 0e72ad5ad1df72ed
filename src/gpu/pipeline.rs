//! # Compute Pipeline Builder
//!
//! Compiles the resolved kernel entry point into a `wgpu::ComputePipeline`
//! bound to the call's device.
//!
//! ## Binding model
//!
//! Every matmul pipeline uses the same single bind group:
//!
//! * Binding `0` - storage buffer, matrix A (read-only)
//! * Binding `1` - storage buffer, matrix B (read-only)
//! * Binding `2` - storage buffer, matrix C (read-write)
//! * Binding `3` - uniform buffer, [`MatmulParams`](crate::engine::types::MatmulParams)
//!
//! ## Errors
//!
//! Shader module creation and pipeline creation run inside a validation error
//! scope. Anything the device rejects (binding mismatch, bad override values,
//! driver compile failure) is surfaced as
//! [`BridgeError::PipelineCompilationFailed`] instead of reaching wgpu's
//! uncaptured error handler.

use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::types::WorkGrid;
use crate::gpu::context::GPUContext;
use crate::gpu::program::{KernelProgram, WorkgroupShape, TILE_OVERRIDES};

/// Compute pipeline plus the layout its bind groups must follow.
#[derive(Debug)]
pub struct MatmulPipeline {
    /// Compiled pipeline.
    pub pipeline: wgpu::ComputePipeline,
    /// Layout of bind group 0.
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Grid and tile the pipeline was specialised for.
    pub work_grid: WorkGrid,
}

/// Resolves the work grid a program will be dispatched with for `size`.
///
/// * tiled kernels get `min(16, size)` per axis,
/// * fixed kernels keep their declared workgroup size, clamped to the grid.
///
/// Clamping a fixed tile never changes the workgroup count: a tile at least as
/// large as the grid is dispatched as a single group either way.
pub fn work_grid_for(program: &KernelProgram, size: u32) -> BridgeResult<WorkGrid> {
    match program.shape() {
        WorkgroupShape::Tiled => WorkGrid::for_size(size),
        WorkgroupShape::Fixed(tile) => {
            let grid = WorkGrid::with_tile(size, tile)?;
            if grid.tile != tile {
                tracing::debug!(declared = %tile, grid = %grid.grid, "kernel workgroup exceeds grid");
            }
            Ok(grid)
        }
    }
}

/// Builds the compute pipeline for `program` on `context`.
///
/// ## Errors
/// Returns [`BridgeError::PipelineCompilationFailed`] if the device rejects
/// the shader module or the pipeline.

pub fn build_pipeline(
    context: &GPUContext,
    program: &KernelProgram,
    work_grid: WorkGrid,
) -> BridgeResult<MatmulPipeline> {
    let device = &context.device;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("matmul_bgl"),
        entries: &[
            storage(0, true),
            storage(1, true),
            storage(2, false),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("matmul_pipeline_layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("matmul_shader"),
        source: program.shader_source(),
    });

    let constants: Vec<(&str, f64)> = match program.shape() {
        WorkgroupShape::Tiled => vec![
            (TILE_OVERRIDES[0], work_grid.tile.x as f64),
            (TILE_OVERRIDES[1], work_grid.tile.y as f64),
        ],
        WorkgroupShape::Fixed(_) => Vec::new(),
    };

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("matmul_compute_pipeline"),
        layout: Some(&layout),
        module: &module,
        entry_point: Some(program.entry_point()),
        compilation_options: wgpu::PipelineCompilationOptions {
            constants: &constants,
            ..Default::default()
        },
        cache: None,
    });

    if let Some(e) = pollster::block_on(device.pop_error_scope()) {
        return Err(BridgeError::PipelineCompilationFailed { message: e.to_string().into() });
    }

    tracing::debug!(
        entry_point = program.entry_point(),
        work_grid = %work_grid,
        "compute pipeline built"
    );

    Ok(MatmulPipeline { pipeline, bind_group_layout, work_grid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::KernelSource;
    use crate::engine::types::Extent3;
    use crate::gpu::program::load_program;

    #[test]
    fn tiled_program_gets_min_16_tile() {
        let program = load_program(&KernelSource::Embedded, "matmul").unwrap();
        for size in [1u32, 8, 16, 17, 100] {
            let grid = work_grid_for(&program, size).unwrap();
            assert_eq!(grid.tile, Extent3::new(size.min(16), size.min(16), 1));
            assert!(grid.tile.fits_within(grid.grid));
        }
    }
}

//! # Kernel Program Loader
//!
//! Loads the kernel module from its configured location and resolves the
//! compute entry point inside it.
//!
//! ## Formats
//!
//! * `.spv` files are parsed as SPIR-V binaries,
//! * every other file, and the embedded kernel, is parsed as WGSL text.
//!
//! Both are lowered to naga IR here, validated, and handed to wgpu as
//! [`wgpu::ShaderSource::Naga`] so the module is only parsed once.
//!
//! ## Tile specialisation
//!
//! A kernel may declare `override TILE_X: u32` and `override TILE_Y: u32` and
//! use them in its `@workgroup_size`. The pipeline builder then specialises
//! them to the dispatch's tile extent. Kernels without these overrides keep
//! their own fixed workgroup size. Any other override-sized workgroup is
//! rejected, since its tile would be unknown at dispatch.

use std::borrow::Cow;
use std::path::Path;

use crate::engine::config::{KernelSource, EMBEDDED_KERNEL_WGSL};
use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::types::Extent3;

/// Pipeline-overridable constants that size the workgroup on x and y.
pub const TILE_OVERRIDES: [&str; 2] = ["TILE_X", "TILE_Y"];

/// Workgroup shape declared by the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkgroupShape {
    /// Sized by the `TILE_X` / `TILE_Y` overrides.
    Tiled,
    /// Fixed in the kernel source.
    Fixed(Extent3),
}

/// A parsed and validated kernel module with a resolved compute entry point.
#[derive(Debug, Clone)]
pub struct KernelProgram {
    origin: String,
    entry_point: String,
    shape: WorkgroupShape,
    module: naga::Module,
}

impl KernelProgram {
    /// Where the module was loaded from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Resolved entry point name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Workgroup shape of the entry point.
    pub fn shape(&self) -> WorkgroupShape {
        self.shape
    }

    /// Shader source for `wgpu::Device::create_shader_module`.
    pub fn shader_source(&self) -> wgpu::ShaderSource<'static> {
        wgpu::ShaderSource::Naga(Cow::Owned(self.module.clone()))
    }
}

/// Loads the kernel from `source` and resolves `entry_point`.
///
/// ## Errors
/// * [`BridgeError::ModuleLoadFailed`]: file unreadable, parse or validation failure
/// * [`BridgeError::EntryPointNotFound`]: no compute entry point with that name

pub fn load_program(source: &KernelSource, entry_point: &str) -> BridgeResult<KernelProgram> {
    let origin = source.to_string();
    let module = match source {
        KernelSource::Embedded => parse_wgsl(EMBEDDED_KERNEL_WGSL, &origin)?,
        KernelSource::Path(path) => parse_file(path, &origin)?,
    };

    validate(&module, &origin)?;

    let shape = resolve_entry_point(&module, entry_point, &origin)?;

    tracing::debug!(origin = %origin, entry_point, shape = ?shape, "kernel module loaded");

    Ok(KernelProgram {
        origin,
        entry_point: entry_point.to_owned(),
        shape,
        module,
    })
}

fn load_failed(origin: &str, message: impl Into<Cow<'static, str>>) -> BridgeError {
    BridgeError::ModuleLoadFailed { origin: origin.to_owned(), message: message.into() }
}

fn parse_file(path: &Path, origin: &str) -> BridgeResult<naga::Module> {
    let is_spirv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("spv"));

    if is_spirv {
        let bytes = std::fs::read(path).map_err(|e| load_failed(origin, e.to_string()))?;
        naga::front::spv::parse_u8_slice(&bytes, &naga::front::spv::Options::default())
            .map_err(|e| load_failed(origin, format!("invalid SPIR-V: {e}")))
    } else {
        let text = std::fs::read_to_string(path).map_err(|e| load_failed(origin, e.to_string()))?;
        parse_wgsl(&text, origin)
    }
}

fn parse_wgsl(text: &str, origin: &str) -> BridgeResult<naga::Module> {
    naga::front::wgsl::parse_str(text)
        .map_err(|e| load_failed(origin, format!("invalid WGSL: {}", e.message())))
}

fn validate(module: &naga::Module, origin: &str) -> BridgeResult<()> {
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(module)
        .map(|_| ())
        .map_err(|e| load_failed(origin, format!("validation failed: {e}")))
}

fn resolve_entry_point(
    module: &naga::Module,
    entry_point: &str,
    origin: &str,
) -> BridgeResult<WorkgroupShape> {
    let ep = module
        .entry_points
        .iter()
        .find(|ep| ep.name == entry_point && ep.stage == naga::ShaderStage::Compute)
        .ok_or_else(|| BridgeError::EntryPointNotFound {
            entry_point: entry_point.to_owned(),
            origin: origin.to_owned(),
        })?;

    let Some(sizes) = ep.workgroup_size_overrides else {
        let [x, y, z] = ep.workgroup_size;
        return Ok(WorkgroupShape::Fixed(Extent3::new(x, y, z)));
    };

    // x and y must each be exactly the matching tile override; z a literal 1.
    let is_override = |slot: Option<naga::Handle<naga::Expression>>, name: &str| {
        slot.is_some_and(|expr| match module.global_expressions[expr] {
            naga::Expression::Override(o) => module.overrides[o].name.as_deref() == Some(name),
            _ => false,
        })
    };
    let tiled = is_override(sizes[0], TILE_OVERRIDES[0])
        && is_override(sizes[1], TILE_OVERRIDES[1])
        && sizes[2].is_none()
        && ep.workgroup_size[2] == 1;

    if tiled {
        Ok(WorkgroupShape::Tiled)
    } else {
        Err(load_failed(
            origin,
            format!(
                "entry point '{entry_point}' must size its workgroup as ({}, {}, 1) when using overrides",
                TILE_OVERRIDES[0], TILE_OVERRIDES[1]
            ),
        ))
    }
}

//! Device resolution.
//!
//! Enumerates adapters for the configured backends, takes the first one and
//! opens a logical device and queue on it. The context is built fresh for each
//! call and dropped when the call returns.

use crate::engine::error::{BridgeError, BridgeResult};

/// GPU device, queue and the adapter they were opened on.
#[derive(Debug)]
pub struct GPUContext {
    /// Adapter name, vendor and backend.
    pub adapter_info: wgpu::AdapterInfo,
    /// Limits the device was opened with.
    pub limits: wgpu::Limits,
    /// Logical device.
    pub device: wgpu::Device,
    /// Submission queue.
    pub queue: wgpu::Queue,
}

impl GPUContext {
    /// Resolves the first adapter available for `backends` and opens it.
    ///
    /// ## Errors
    /// * [`BridgeError::NoDeviceFound`] if enumeration yields no adapter
    /// * [`BridgeError::DeviceRequestFailed`] if the adapter refuses the device

    pub fn new(backends: wgpu::Backends) -> BridgeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .enumerate_adapters(backends)
            .into_iter()
            .next()
            .ok_or(BridgeError::NoDeviceFound)?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();

        tracing::info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "using gpu adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("matmul_bridge_device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            ..Default::default()
        }))
        .map_err(|e| BridgeError::DeviceRequestFailed {
            adapter: adapter_info.name.clone(),
            message: e.to_string().into(),
        })?;

        Ok(Self { adapter_info, limits, device, queue })
    }

    /// Largest buffer the device will accept for a storage binding.
    pub fn max_storage_bytes(&self) -> u64 {
        self.limits
            .max_buffer_size
            .min(self.limits.max_storage_buffer_binding_size as u64)
    }
}

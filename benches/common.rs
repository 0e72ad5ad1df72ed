#![allow(dead_code)]

use matmul_bridge::{run_matmul, BridgeConfig, BridgeError};

pub const SIZES_SMALL: [u32; 3] = [64, 128, 256];
pub const SIZES_LARGE: [u32; 2] = [512, 1024];

pub fn pattern(size: u32, seed: f32) -> Vec<f32> {
    (0..size as usize * size as usize)
        .map(|i| ((i as f32 * 0.37 + seed) % 5.0) - 2.0)
        .collect()
}

pub struct Operands {
    pub size: u32,
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub c: Vec<f32>,
}

impl Operands {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            a: pattern(size, 0.5),
            b: pattern(size, 1.5),
            c: vec![0.0; size as usize * size as usize],
        }
    }
}

/// Runs one tiny call to find out whether GPU benches can run here.
pub fn gpu_available(config: &BridgeConfig) -> bool {
    let mut c = [0.0f32; 1];
    match run_matmul(config, &[1.0], &[1.0], &mut c, 1) {
        Ok(_) => true,
        Err(e @ (BridgeError::NoDeviceFound | BridgeError::DeviceRequestFailed { .. })) => {
            eprintln!("gpu benches skipped: {e}");
            false
        }
        Err(e) => panic!("gpu probe failed: {e}"),
    }
}

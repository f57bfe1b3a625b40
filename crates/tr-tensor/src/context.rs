use log::{debug, warn};

use crate::backend::ComputeBackend;
use crate::config::RuntimeConfig;
use crate::cpu::CpuBackend;
use crate::device::Device;
use crate::error::{Result, TensorError};

/// Per-caller execution context: the active device, the runtime configuration
/// and the compute backends operators dispatch to.
///
/// Every operator takes `&mut Context` instead of consulting process-wide
/// state, so callers on different threads never race on device selection.
#[derive(Debug)]
pub struct Context {
    config: RuntimeConfig,
    current: Device,
    cpu: CpuBackend,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Context {
    /// Starts on `config.default_device`, or on the host if that device is
    /// not available.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut ctx = Context {
            config,
            current: Device::Cpu,
            cpu: CpuBackend::new(),
        };
        let requested = ctx.config.default_device;
        if let Err(e) = ctx.set_device(requested) {
            warn!("{}; starting on {}", e, ctx.current);
        }
        ctx
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Device selected by the last successful [`set_device`](Self::set_device).
    pub fn current_device(&self) -> Device {
        self.current
    }

    /// Activates `device` for subsequent allocation and dispatch.
    ///
    /// Only the host is available; accelerator devices report
    /// `CapabilityUnavailable` and leave the current device unchanged.
    pub fn set_device(&mut self, device: Device) -> Result<()> {
        if !device.is_cpu() {
            return Err(TensorError::CapabilityUnavailable {
                op: "set_device",
                device,
            });
        }
        if self.current != device {
            debug!("switching device {} -> {}", self.current, device);
        }
        self.current = device;
        Ok(())
    }

    /// Backend that runs kernels for tensors on `device`.
    ///
    /// Host tensors go straight to the CPU backend. Any other device is first
    /// activated, then dispatched by device kind.
    pub fn backend_for(&mut self, op: &'static str, device: Device) -> Result<&dyn ComputeBackend> {
        if device.is_cpu() {
            return Ok(&self.cpu);
        }
        self.set_device(device)?;
        match device {
            Device::Cpu => Ok(&self.cpu),
            Device::Nvidia(_) => Err(TensorError::CapabilityUnavailable { op, device }),
        }
    }
}

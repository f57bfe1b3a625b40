use std::fmt;

/// Device a storage buffer lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    /// Host memory.
    #[default]
    Cpu,
    /// NVIDIA accelerator with device index. No runtime is compiled in; every
    /// allocation or kernel targeting it reports `CapabilityUnavailable`.
    Nvidia(usize),
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Nvidia(idx) => write!(f, "nvidia:{idx}"),
        }
    }
}

use crate::device::Device;

/// How the embedding kernel treats indices outside `[0, vocab)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Any out-of-range index leaves its output row untouched.
    #[default]
    SkipInvalid,
    /// Rows whose index equals this value are left untouched; any other
    /// out-of-range index is rejected before anything is written.
    IgnoreIndex(i64),
    /// Every out-of-range index is rejected before anything is written.
    Strict,
}

impl IndexPolicy {
    /// Returns true if `index` may be skipped silently under this policy.
    pub fn allows_skip(&self, index: i64) -> bool {
        match self {
            IndexPolicy::SkipInvalid => true,
            IndexPolicy::IgnoreIndex(ignored) => index == *ignored,
            IndexPolicy::Strict => false,
        }
    }
}

/// Runtime configuration carried by a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Policy for out-of-range embedding indices. Defaults to `SkipInvalid`.
    pub index_policy: IndexPolicy,
    /// Device a fresh context starts on. Defaults to the host.
    pub default_device: Device,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            index_policy: IndexPolicy::SkipInvalid,
            default_device: Device::Cpu,
        }
    }
}

impl RuntimeConfig {
    pub fn with_index_policy(mut self, policy: IndexPolicy) -> Self {
        self.index_policy = policy;
        self
    }
}

//! `tr-tensor` - Strided tensors and transformer inference kernels for tensor-runtime.
//!
//! This crate provides:
//! - A `Tensor` view type over reference-counted, bounds-checked `Storage`
//! - Zero-copy views: permute, slice, view
//! - A `Context` carrying the active device and `RuntimeConfig`
//! - Validated operator entry points in [`ops`]: embedding, linear, rms_norm,
//!   rope, self_attention, argmax, rearrange
//! - A `ComputeBackend` trait with a reference `CpuBackend`
//! - Data type definitions (F32, F16, BF16, I64 and auxiliary integer types)

pub mod backend;
pub mod config;
pub mod context;
pub mod cpu;
mod debug;
pub mod device;
pub mod dtype;
pub mod element;
pub mod error;
pub mod layout;
pub mod ops;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use backend::ComputeBackend;
pub use config::{IndexPolicy, RuntimeConfig};
pub use context::Context;
pub use cpu::CpuBackend;
pub use device::Device;
pub use dtype::DType;
pub use element::{Element, Float};
pub use error::{Result, TensorError};
pub use layout::TensorMeta;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;

use std::fmt::{Display, Write};

use half::{bf16, f16};

use crate::dtype::DType;
use crate::element::Float;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

const OP: &str = "dump";

fn push_rows<T: Display>(text: &mut String, values: &[T], row_len: usize) {
    if values.is_empty() || row_len == 0 {
        return;
    }
    for row in values.chunks(row_len) {
        let mut sep = "";
        for v in row {
            // Writing into a String cannot fail.
            let _ = write!(text, "{}{}", sep, v);
            sep = " ";
        }
        text.push('\n');
    }
}

fn widen<T: Float>(values: Vec<T>) -> Vec<f32> {
    values.into_iter().map(Float::to_f32).collect()
}

impl Tensor {
    /// Renders [`info`](Tensor::info) followed by the elements in logical order,
    /// one line per innermost row. 16-bit floats print as their f32 value.
    pub fn dump(&self) -> Result<String> {
        if !self.device().is_cpu() {
            return Err(TensorError::CapabilityUnavailable {
                op: OP,
                device: self.device(),
            });
        }
        let row_len = self.shape().last().copied().unwrap_or(1);
        let mut text = self.info();
        text.push('\n');
        let t = &mut text;
        match self.dtype() {
            DType::F32 => push_rows(t, &self.gather::<f32>(OP)?, row_len),
            DType::F16 => push_rows(t, &widen(self.gather::<f16>(OP)?), row_len),
            DType::BF16 => push_rows(t, &widen(self.gather::<bf16>(OP)?), row_len),
            DType::F64 => push_rows(t, &self.gather::<f64>(OP)?, row_len),
            DType::I8 => push_rows(t, &self.gather::<i8>(OP)?, row_len),
            DType::I16 => push_rows(t, &self.gather::<i16>(OP)?, row_len),
            DType::I32 => push_rows(t, &self.gather::<i32>(OP)?, row_len),
            DType::I64 => push_rows(t, &self.gather::<i64>(OP)?, row_len),
            DType::Byte | DType::U8 => push_rows(t, &self.gather::<u8>(OP)?, row_len),
            DType::U16 => push_rows(t, &self.gather::<u16>(OP)?, row_len),
            DType::U32 => push_rows(t, &self.gather::<u32>(OP)?, row_len),
            DType::U64 => push_rows(t, &self.gather::<u64>(OP)?, row_len),
            DType::Bool => {
                let flags: Vec<bool> = self.gather::<u8>(OP)?.into_iter().map(|b| b != 0).collect();
                push_rows(t, &flags, row_len)
            }
        }
        Ok(text)
    }

    /// Prints [`dump`](Tensor::dump) to stdout.
    pub fn debug(&self) -> Result<()> {
        print!("{}", self.dump()?);
        Ok(())
    }
}

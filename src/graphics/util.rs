//! Utilities for communicating with the GPU.

use crate::math::uv;
use zerocopy::{AsBytes, FromBytes};

/// Utility type to convert transform matrices to a form that can
/// be sent to a shader.
#[derive(Clone, Copy, Debug, AsBytes, FromBytes)]
#[repr(transparent)]
pub struct GpuMat4([f32; 16]);

impl From<uv::Mat4> for GpuMat4 {
    fn from(mat: uv::Mat4) -> Self {
        let mut out = [0.; 16];
        out.copy_from_slice(mat.as_array());
        GpuMat4(out)
    }
}

/// A GPU buffer that grows when more data is written than fits in it.
///
/// Bind groups referring to the buffer must be recreated
/// when [`write`][Self::write] reports that it reallocated.
#[derive(Debug)]
pub struct DynamicBuffer {
    label: Option<String>,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: wgpu::BufferAddress,
    len: wgpu::BufferAddress,
}

impl DynamicBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: Option<&str>,
        usage: wgpu::BufferUsages,
        capacity: wgpu::BufferAddress,
    ) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let capacity = wgpu::util::align_to(capacity.max(1), wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = Self::create(device, label, usage, capacity);
        Self {
            label: label.map(str::to_string),
            usage,
            buffer,
            capacity,
            len: 0,
        }
    }

    fn create(
        device: &wgpu::Device,
        label: Option<&str>,
        usage: wgpu::BufferUsages,
        size: wgpu::BufferAddress,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Replace the contents of the buffer.
    ///
    /// Returns `true` if the buffer had to be reallocated.
    pub fn write<T: AsBytes>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[T],
    ) -> bool {
        let bytes = data.as_bytes();
        self.len = bytes.len() as wgpu::BufferAddress;
        if bytes.is_empty() {
            return false;
        }

        // writes must be a multiple of the copy alignment
        let padded_len = wgpu::util::align_to(self.len, wgpu::COPY_BUFFER_ALIGNMENT);
        let mut reallocated = false;
        if padded_len > self.capacity {
            self.capacity = padded_len.next_power_of_two();
            self.buffer = Self::create(device, self.label.as_deref(), self.usage, self.capacity);
            reallocated = true;
        }

        if padded_len == self.len {
            queue.write_buffer(&self.buffer, 0, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(padded_len as usize, 0);
            queue.write_buffer(&self.buffer, 0, &padded);
        }
        reallocated
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// The part of the buffer that was filled by the last write.
    #[inline]
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..self.len.max(1).min(self.capacity))
    }

    /// Number of bytes written by the last write.
    #[inline]
    pub fn len(&self) -> wgpu::BufferAddress {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat4_is_column_major() {
        let mat = uv::Mat4::from_translation(uv::Vec3::new(1., 2., 3.));
        let gpu = GpuMat4::from(mat);
        assert_eq!(&gpu.0[12..15], &[1., 2., 3.]);
        assert_eq!(gpu.as_bytes().len(), 64);
    }
}

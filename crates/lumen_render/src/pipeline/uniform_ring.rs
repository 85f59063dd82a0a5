//! Dynamic-offset uniform buffers
//!
//! Every draw in a frame gets its own slot; the slots are written in one
//! `write_buffer` and selected with a dynamic offset when drawing. The buffer
//! grows (and its bind group is rebuilt) when a frame needs more slots.

use super::layouts::align_to;

pub struct UniformRing {
    label: &'static str,
    /// Bytes between slots, a multiple of the device offset alignment
    stride: u64,
    /// Size of the binding each slot exposes
    binding_size: u64,
    capacity: usize,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    staging: Vec<u8>,
}

impl UniformRing {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        binding_size: u64,
        capacity: usize,
    ) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = align_to(binding_size, alignment);
        let capacity = capacity.max(1);
        let (buffer, bind_group) = Self::allocate(device, layout, label, stride, binding_size, capacity);
        Self {
            label,
            stride,
            binding_size,
            capacity,
            buffer,
            bind_group,
            staging: Vec::new(),
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        stride: u64,
        binding_size: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(binding_size),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Start a frame's worth of slots
    pub fn begin(&mut self) {
        self.staging.clear();
    }

    /// Stage `bytes` in the next slot and return its dynamic offset
    ///
    /// Bytes beyond the binding size are dropped; shorter blocks are zero padded.
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.staging.len();
        let used = bytes.len().min(self.binding_size as usize);
        self.staging.extend_from_slice(&bytes[..used]);
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    /// Upload the staged slots, growing the buffer if needed
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) {
        let slots = self.staging.len() / self.stride as usize;
        if slots > self.capacity {
            let capacity = slots.next_power_of_two();
            log::debug!("Growing {} to {} slots", self.label, capacity);
            let (buffer, bind_group) =
                Self::allocate(device, layout, self.label, self.stride, self.binding_size, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }
}

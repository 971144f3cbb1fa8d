use std::sync::mpsc;

use bytemuck::Pod;
use log::info;

/// Object that can be attached to a pipeline.
pub trait Bindable {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource<'_>)>;
}

/// Storage buffer living in VRAM; the host can only write it through the
/// queue and read it back through [`StorageBuffer::download()`].
#[derive(Debug)]
pub struct StorageBuffer {
    buffer: wgpu::Buffer,
}

impl StorageBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let label = format!("riptide_{}", label.as_ref());
        let size = pad_size(size);

        info!("Allocating storage buffer `{label}`; size={size}");

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC
                | usage,
            size: size as _,
            mapped_at_creation: false,
        });

        Self { buffer }
    }

    /// Allocates a buffer able to hold given items and uploads them.
    pub fn with_data<T>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: impl AsRef<str>,
        items: &[T],
    ) -> Self
    where
        T: Pod,
    {
        let this = Self::new(
            device,
            label,
            std::mem::size_of_val(items),
            wgpu::BufferUsages::empty(),
        );

        this.write(queue, 0, items);
        this
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }

    /// Schedules a write of given items, starting at given item's offset.
    pub fn write<T>(&self, queue: &wgpu::Queue, offset: usize, items: &[T])
    where
        T: Pod,
    {
        if items.is_empty() {
            return;
        }

        let offset = offset * std::mem::size_of::<T>();

        queue.write_buffer(
            &self.buffer,
            offset as _,
            bytemuck::cast_slice(items),
        );
    }

    /// Copies the buffer's contents back into host memory, blocking until
    /// the device is done with every previously submitted work.
    pub fn download<T>(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        len: usize,
    ) -> Vec<T>
    where
        T: Pod,
    {
        let size = (len * std::mem::size_of::<T>()) as u64;

        assert!(
            size <= self.size(),
            "cannot download {size} bytes from a buffer of {} bytes",
            self.size(),
        );

        if size == 0 {
            return Vec::new();
        }

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("riptide_staging"),
            usage: wgpu::BufferUsages::MAP_READ
                | wgpu::BufferUsages::COPY_DST,
            size: pad_size(size as usize) as _,
            mapped_at_creation: false,
        });

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("riptide_download"),
            });

        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
        queue.submit([encoder.finish()]);

        let slice = staging.slice(..size);
        let (tx, rx) = mpsc::channel();

        slice.map_async(wgpu::MapMode::Read, move |result| {
            _ = tx.send(result);
        });

        device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => (),
            Ok(Err(err)) => panic!("couldn't map staging buffer: {err}"),
            Err(_) => panic!("staging buffer has not been mapped"),
        }

        let items = slice
            .get_mapped_range()
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect();

        staging.unmap();
        items
    }

    pub fn as_ro_bind(&self) -> impl Bindable + '_ {
        StorageBufferBinder {
            parent: self,
            read_only: true,
        }
    }

    pub fn as_rw_bind(&self) -> impl Bindable + '_ {
        StorageBufferBinder {
            parent: self,
            read_only: false,
        }
    }
}

pub struct StorageBufferBinder<'a> {
    parent: &'a StorageBuffer,
    read_only: bool,
}

impl Bindable for StorageBufferBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource<'_>)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage {
                    read_only: self.read_only,
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let resource = self.parent.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}

/// Rounds size up so that it satisfies copy alignment and can hold at least
/// one element of every struct the kernels use; empty scenes still need
/// something to bind.
fn pad_size(size: usize) -> usize {
    size.max(64).next_multiple_of(16)
}

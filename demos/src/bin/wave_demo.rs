//! # Wave Demo
//!
//! Headless frame loop exercising every synchronization path of the
//! attribute cache: creation, partial upload, full upload, the per-frame
//! no-op, and eviction.
//!
//! A grid of vertices is deformed by a travelling sine wave. Most frames
//! only a band of the grid moves, so the cache performs bounded partial
//! uploads; every 30th frame the whole grid is re-derived from the rest
//! positions, forcing a full upload.
//!
//! Run with `RUST_LOG=trace` to watch the per-resource upload decisions.

use amaranth_core::math::Vec3;
use amaranth_graphics::attribute::{BufferAttribute, ItemRange, UsageHint};
use amaranth_graphics::{create_backend, AttributeBuffers, BufferTarget};

const GRID: usize = 64;
const FRAMES: usize = 120;

fn grid_positions() -> Vec<Vec3> {
    let mut positions = Vec::with_capacity(GRID * GRID);
    for z in 0..GRID {
        for x in 0..GRID {
            positions.push(Vec3::new(x as f32, 0.0, z as f32));
        }
    }
    positions
}

fn grid_indices() -> Vec<u16> {
    let mut indices = Vec::new();
    for z in 0..GRID - 1 {
        for x in 0..GRID - 1 {
            let i = (z * GRID + x) as u16;
            let row = GRID as u16;
            indices.extend_from_slice(&[i, i + 1, i + row, i + 1, i + row + 1, i + row]);
        }
    }
    indices
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    amaranth_graphics::init();
    let backend = create_backend()?;
    log::info!("Backend: {}", backend.name());

    let rest = grid_positions();
    let mut positions = BufferAttribute::from_vec3s(&rest)
        .with_label("wave positions")
        .with_usage(UsageHint::Stream);
    let mut indices = BufferAttribute::new(grid_indices(), 3)?.with_label("wave indices");

    let mut cache = AttributeBuffers::new(backend);

    for frame in 0..FRAMES {
        if frame % 30 == 0 && frame > 0 {
            // Rebuild the whole grid from rest positions.
            positions.copy_vec3s(&rest)?;
        } else {
            // Animate one band of rows around the wave front.
            let front = frame % GRID;
            let band_start = front.saturating_sub(4);
            let band_rows = (front + 4).min(GRID) - band_start;
            for z in band_start..band_start + band_rows {
                for x in 0..GRID {
                    let phase = (x as f32 * 0.3) + (frame as f32 * 0.2);
                    positions.set(z * GRID + x, 1, phase.sin())?;
                }
            }
            positions.mark_changed_range(ItemRange::new(band_start * GRID, band_rows * GRID))?;
        }

        // Per-frame synchronization, immediately before binding.
        let _vertex_buffer = cache.ensure_synchronized(&mut positions, BufferTarget::Vertex)?;
        let _index_buffer = cache.ensure_synchronized(&mut indices, BufferTarget::Index)?;

        // A second call in the same frame is free.
        cache.ensure_synchronized(&mut positions, BufferTarget::Vertex)?;

        if frame % 30 == 0 {
            log::info!(
                "frame {:3}: positions v{}, indices v{}, {} cached buffers",
                frame,
                positions.version(),
                indices.version(),
                cache.len()
            );
        }
    }

    // Geometry teardown: release the GPU side explicitly.
    cache.evict(positions.id());
    cache.evict(indices.id());
    log::info!("Done: {} frames, cache empty: {}", FRAMES, cache.is_empty());
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("wave demo failed: {e}");
        std::process::exit(1);
    }
}

//! Draw-time validation (spec §4.7): the ordered checks every
//! draw/dispatch/clear/blit/barrier call runs before a single backend call
//! is made. Every function here is pure with respect to backend state —
//! [`crate::renderer::Renderer`]'s command recording methods gather the
//! inputs and call these in the documented order, so a validation failure
//! never has a chance to touch the backend.

use crate::command_buffer::{ClearAttachment, ClearValue, IndexedDrawRange};
use crate::error::{Error, ErrorKind, Result};
use crate::render_pass::{AccessTypes, PipelineStages};
use crate::resource::BufferUsage;

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidArgument, message)
}

fn denied(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::PermissionDenied, message)
}

/// Step 1-2: render pass / shader binding and secondary-recording state.
pub fn validate_draw_state(render_pass_bound: bool, shader_bound: bool, secondary_render_pass_commands: bool, recording_into_primary: bool) -> Result<()> {
    if !render_pass_bound {
        return Err(denied("draw call requires a bound render pass"));
    }
    if !shader_bound {
        return Err(denied("draw call requires a bound shader"));
    }
    if secondary_render_pass_commands && recording_into_primary {
        return Err(denied("current subpass was declared secondary; commands must go through a secondary command buffer"));
    }
    Ok(())
}

/// Same as [`validate_draw_state`] but for `dispatchCompute*`, which needs
/// no render pass.
pub fn validate_dispatch_state(compute_shader_bound: bool) -> Result<()> {
    if !compute_shader_bound {
        return Err(denied("dispatch call requires a bound compute shader"));
    }
    Ok(())
}

/// Step 3: a non-indexed draw range lies within the bound geometry's vertex
/// count.
pub fn validate_draw_range(vertex_count: u32, first_vertex: u32, requested_count: u32) -> Result<()> {
    if requested_count == 0 {
        return Err(invalid("draw vertex count must be non-zero"));
    }
    let end = first_vertex.checked_add(requested_count).ok_or_else(|| invalid("draw range overflows"))?;
    if end > vertex_count {
        return Err(invalid(format!("draw range [{first_vertex}, {end}) exceeds {vertex_count} vertices")));
    }
    Ok(())
}

/// Step 3: an indexed draw range lies within the bound index buffer and
/// requires a non-zero index count.
pub fn validate_indexed_draw_range(index_count: u32, range: IndexedDrawRange) -> Result<()> {
    if range.index_count == 0 {
        return Err(invalid("indexed draw requires a non-zero index count"));
    }
    let end = range.first_index.checked_add(range.index_count).ok_or_else(|| invalid("indexed draw range overflows"))?;
    if end > index_count {
        return Err(invalid(format!("indexed draw range [{}, {end}) exceeds {index_count} indices", range.first_index)));
    }
    Ok(())
}

/// Step 4: an indirect draw/dispatch buffer carries the right usage, has
/// an aligned offset, and the requested range fits inside it.
pub fn validate_indirect_buffer(buffer_size: u64, buffer_usage: BufferUsage, required_usage: BufferUsage, offset: u64, struct_size: u64, stride: u64, count: u32) -> Result<()> {
    if !buffer_usage.contains(required_usage) {
        return Err(invalid(format!("indirect buffer is missing required usage {required_usage:?}")));
    }
    if stride < struct_size {
        return Err(invalid(format!("indirect stride {stride} is smaller than the {struct_size}-byte argument struct")));
    }
    if offset % 4 != 0 {
        return Err(invalid("indirect buffer offset must be 4-byte aligned"));
    }
    let total = offset
        .checked_add((count as u64).saturating_mul(stride))
        .ok_or_else(|| invalid("indirect buffer range overflows"))?;
    if total > buffer_size {
        return Err(invalid(format!("indirect buffer range {total} exceeds buffer size {buffer_size}")));
    }
    Ok(())
}

/// Step 5: instanced-drawing capability gating.
pub fn validate_instancing(has_instanced_drawing: bool, has_start_instance: bool, first_instance: u32, instance_count: u32) -> Result<()> {
    if !has_instanced_drawing && (first_instance != 0 || instance_count != 1) {
        return Err(denied("backend has no instanced drawing support; first_instance must be 0 and instance_count must be 1"));
    }
    if first_instance != 0 && !has_start_instance {
        return Err(denied("backend cannot start an instanced draw at a non-zero instance"));
    }
    Ok(())
}

/// Step 6: `clearAttachments` — every clear targets an attachment that is
/// actually bound with a compatible kind, and its region fits the
/// framebuffer.
pub fn validate_clear_attachments(
    clears: &[ClearAttachment],
    bound_color_attachments: &[bool],
    has_depth_stencil_attachment: bool,
    framebuffer_width: u32,
    framebuffer_height: u32,
    region: Option<(u32, u32, u32, u32)>,
) -> Result<()> {
    if let Some((x, y, w, h)) = region {
        if x.checked_add(w).map_or(true, |r| r > framebuffer_width) || y.checked_add(h).map_or(true, |r| r > framebuffer_height) {
            return Err(invalid("clear region exceeds framebuffer extents"));
        }
    }
    for clear in clears {
        match clear.value {
            ClearValue::DepthStencil { .. } => {
                if !has_depth_stencil_attachment {
                    return Err(invalid("depth/stencil clear requires a bound depth/stencil attachment"));
                }
            }
            ClearValue::Color(_) | ClearValue::ColorInt(_) | ClearValue::ColorUint(_) => {
                let bound = bound_color_attachments.get(clear.attachment_index as usize).copied().unwrap_or(false);
                if !bound {
                    return Err(invalid(format!("clear references unbound color attachment {}", clear.attachment_index)));
                }
            }
        }
    }
    Ok(())
}

/// Step 7: `memoryBarrier` inside a render pass requires a self-dependency
/// on the active subpass whose masks cover the requested stages.
pub fn validate_memory_barrier_in_render_pass(self_dependencies: &[(PipelineStages, PipelineStages, AccessTypes, AccessTypes)], before_stages: PipelineStages, after_stages: PipelineStages) -> Result<()> {
    let covered = self_dependencies.iter().any(|(src_stages, dst_stages, _, _)| src_stages.contains(before_stages) && dst_stages.contains(after_stages));
    if !covered {
        return Err(invalid("memory barrier requires a self-dependency covering the requested stage masks"));
    }
    Ok(())
}

/// Step 8: `blitSurface` region/format compatibility.
pub fn validate_blit(src_allows_blit_from: bool, dst_allows_blit_to: bool, formats_compatible: bool, src_region: (u32, u32, u32, u32), dst_region: (u32, u32, u32, u32), block_size: u32) -> Result<()> {
    if !src_allows_blit_from {
        return Err(invalid("source does not allow blit-from"));
    }
    if !dst_allows_blit_to {
        return Err(invalid("destination does not allow blit-to"));
    }
    if !formats_compatible {
        return Err(invalid("source and destination formats are not blit-compatible"));
    }
    for (x, y, w, h) in [src_region, dst_region] {
        if x % block_size != 0 || y % block_size != 0 || w % block_size != 0 || h % block_size != 0 {
            return Err(invalid(format!("blit region ({x}, {y}, {w}, {h}) does not align to the {block_size}-texel block size")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_range_rejects_out_of_bounds() {
        assert!(validate_draw_range(10, 5, 6).is_err());
        assert!(validate_draw_range(10, 5, 5).is_ok());
    }

    #[test]
    fn indirect_buffer_requires_usage_and_alignment() {
        let err = validate_indirect_buffer(1024, BufferUsage::UNIFORM_BLOCK, BufferUsage::INDIRECT_DRAW, 0, 16, 16, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = validate_indirect_buffer(1024, BufferUsage::INDIRECT_DRAW, BufferUsage::INDIRECT_DRAW, 2, 16, 16, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert!(validate_indirect_buffer(1024, BufferUsage::INDIRECT_DRAW, BufferUsage::INDIRECT_DRAW, 0, 16, 16, 4).is_ok());
    }

    #[test]
    fn instancing_without_support_requires_defaults() {
        assert!(validate_instancing(false, false, 0, 1).is_ok());
        assert!(validate_instancing(false, false, 0, 2).is_err());
        assert!(validate_instancing(true, false, 1, 2).is_err());
        assert!(validate_instancing(true, true, 1, 2).is_ok());
    }

    #[test]
    fn memory_barrier_requires_covering_self_dependency() {
        let deps = [(PipelineStages::COLOR_OUTPUT, PipelineStages::FRAGMENT_SHADER, AccessTypes::COLOR_ATTACHMENT_WRITE, AccessTypes::INPUT_ATTACHMENT_READ)];
        assert!(validate_memory_barrier_in_render_pass(&deps, PipelineStages::COLOR_OUTPUT, PipelineStages::FRAGMENT_SHADER).is_ok());
        assert!(validate_memory_barrier_in_render_pass(&deps, PipelineStages::ALL_GRAPHICS, PipelineStages::FRAGMENT_SHADER).is_err());
    }
}

//! Construction-time render pass validation (spec §4.6, first paragraph).
//!
//! Every check here runs before a single backend call is made; a failure
//! never reaches [`crate::backend::Backend::create_render_pass`].

use crate::error::{Error, ErrorKind, Result};

use super::types::{RenderPassDescription, EXTERNAL_SUBPASS, NO_ATTACHMENT};

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidArgument, message)
}

/// Validates a description in isolation, given the caller's
/// `max_color_attachments` capability and whether the backend requires at
/// least one attachment to be backed by a real surface.
pub fn validate_render_pass_description(desc: &RenderPassDescription, max_color_attachments: u32, requires_any_surface: bool) -> Result<()> {
    if desc.attachments.is_empty() {
        return Err(invalid("render pass must declare at least one attachment"));
    }
    for (i, attachment) in desc.attachments.iter().enumerate() {
        if !attachment.format.is_color() && !attachment.format.is_depth_stencil() {
            return Err(invalid(format!("attachment {i} has a non-rendertargetable format")));
        }
        if attachment.samples == 0 {
            return Err(invalid(format!("attachment {i} has zero samples")));
        }
    }

    for (i, subpass) in desc.subpasses.iter().enumerate() {
        if subpass.color_attachments.len() as u32 > max_color_attachments {
            return Err(invalid(format!(
                "subpass {i} uses {} color attachments, more than the {max_color_attachments} the backend supports",
                subpass.color_attachments.len()
            )));
        }

        let mut sample_count = None;
        for color in subpass.color_attachments.iter().filter(|a| a.is_bound()) {
            let attachment = get_attachment(desc, color.index, i)?;
            if attachment.format.is_depth_stencil() {
                return Err(invalid(format!("subpass {i} binds a depth/stencil format as a color attachment")));
            }
            check_consistent_samples(&mut sample_count, attachment.samples, i)?;
        }
        if subpass.depth_stencil_attachment.is_bound() {
            let attachment = get_attachment(desc, subpass.depth_stencil_attachment.index, i)?;
            if !attachment.format.is_depth_stencil() {
                return Err(invalid(format!("subpass {i} binds a color format as its depth/stencil attachment")));
            }
            check_consistent_samples(&mut sample_count, attachment.samples, i)?;
        }
        for &input in &subpass.input_attachments {
            if input != NO_ATTACHMENT {
                get_attachment(desc, input, i)?;
            }
        }
    }

    if requires_any_surface && desc.attachments.is_empty() {
        return Err(invalid("backend requires at least one surface-backed attachment"));
    }

    let subpass_count = desc.subpasses.len() as u32;
    for (i, dependency) in desc.subpass_dependencies.iter().enumerate() {
        check_subpass_index(dependency.src_subpass, subpass_count, i)?;
        check_subpass_index(dependency.dst_subpass, subpass_count, i)?;
        if dependency.src_subpass != EXTERNAL_SUBPASS && dependency.dst_subpass != EXTERNAL_SUBPASS && dependency.src_subpass > dependency.dst_subpass {
            return Err(invalid(format!("dependency {i} has src_subpass > dst_subpass")));
        }
        if dependency.src_subpass == dependency.dst_subpass && !dependency.region_dependency {
            return Err(invalid(format!("self-dependency {i} must be a region dependency")));
        }
    }

    Ok(())
}

fn get_attachment(desc: &RenderPassDescription, index: u32, subpass: usize) -> Result<&super::types::AttachmentInfo> {
    desc.attachments
        .get(index as usize)
        .ok_or_else(|| invalid(format!("subpass {subpass} references out-of-range attachment {index}")))
}

fn check_consistent_samples(running: &mut Option<u32>, samples: u32, subpass: usize) -> Result<()> {
    match *running {
        Some(existing) if existing != samples => Err(invalid(format!("subpass {subpass} mixes sample counts {existing} and {samples}"))),
        _ => {
            *running = Some(samples);
            Ok(())
        }
    }
}

fn check_subpass_index(index: u32, subpass_count: u32, dependency: usize) -> Result<()> {
    if index != EXTERNAL_SUBPASS && index >= subpass_count {
        return Err(invalid(format!("dependency {dependency} references out-of-range subpass {index}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_pass::types::{AttachmentInfo, AttachmentRef, AttachmentUsage, SubpassInfo};
    use crate::resource::GfxFormat;

    fn color_attachment() -> AttachmentInfo {
        AttachmentInfo { format: GfxFormat::R8G8B8A8Unorm, samples: 1, usage: AttachmentUsage::CLEAR }
    }

    #[test]
    fn single_color_subpass_is_valid() {
        let desc = RenderPassDescription {
            attachments: vec![color_attachment()],
            subpasses: vec![SubpassInfo {
                name: "main".into(),
                input_attachments: vec![],
                color_attachments: vec![AttachmentRef { index: 0, resolve: false }],
                depth_stencil_attachment: AttachmentRef::NONE,
            }],
            subpass_dependencies: vec![],
        };
        assert!(validate_render_pass_description(&desc, 4, false).is_ok());
    }

    #[test]
    fn mismatched_sample_counts_are_rejected() {
        let desc = RenderPassDescription {
            attachments: vec![color_attachment(), AttachmentInfo { samples: 4, ..color_attachment() }],
            subpasses: vec![SubpassInfo {
                name: "main".into(),
                input_attachments: vec![],
                color_attachments: vec![AttachmentRef { index: 0, resolve: false }, AttachmentRef { index: 1, resolve: false }],
                depth_stencil_attachment: AttachmentRef::NONE,
            }],
            subpass_dependencies: vec![],
        };
        let err = validate_render_pass_description(&desc, 4, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn self_dependency_must_be_region_dependency() {
        use crate::render_pass::types::{AccessTypes, PipelineStages, SubpassDependency};

        let desc = RenderPassDescription {
            attachments: vec![color_attachment()],
            subpasses: vec![SubpassInfo {
                name: "main".into(),
                input_attachments: vec![],
                color_attachments: vec![AttachmentRef { index: 0, resolve: false }],
                depth_stencil_attachment: AttachmentRef::NONE,
            }],
            subpass_dependencies: vec![SubpassDependency {
                src_subpass: 0,
                dst_subpass: 0,
                src_stages: PipelineStages::COLOR_OUTPUT,
                dst_stages: PipelineStages::COLOR_OUTPUT,
                src_access: AccessTypes::COLOR_ATTACHMENT_WRITE,
                dst_access: AccessTypes::COLOR_ATTACHMENT_READ,
                region_dependency: false,
            }],
        };
        let err = validate_render_pass_description(&desc, 4, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

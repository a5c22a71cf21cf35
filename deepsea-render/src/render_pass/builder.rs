//! Default subpass-dependency derivation (spec §4.6): when a
//! [`RenderPassDescription`] is built with an empty dependency list, the
//! renderer fills one in automatically rather than forcing every caller to
//! reason about barriers by hand.

use super::types::{AccessTypes, AttachmentRef, PipelineStages, RenderPassDescription, SubpassDependency, SubpassInfo, EXTERNAL_SUBPASS};

/// A subpass's attachment usage, reduced to the sets the dependency rules
/// care about.
struct Usage {
    written: Vec<u32>,
    input: Vec<u32>,
}

fn usage_of(subpass: &SubpassInfo) -> Usage {
    let mut written: Vec<u32> = subpass.color_attachments.iter().filter(|a| a.is_bound()).map(|a| a.index).collect();
    if subpass.depth_stencil_attachment.is_bound() {
        written.push(subpass.depth_stencil_attachment.index);
    }
    let input = subpass.input_attachments.iter().copied().filter(|&i| i != super::types::NO_ATTACHMENT).collect();
    Usage { written, input }
}

fn referenced(usage: &Usage) -> Vec<u32> {
    let mut all = usage.written.clone();
    all.extend(usage.input.iter().copied());
    all
}

fn shares_attachment(a: &[u32], b: &[u32]) -> bool {
    a.iter().any(|x| b.contains(x))
}

fn is_depth(subpass: &SubpassInfo, attachment: u32) -> bool {
    subpass.depth_stencil_attachment.is_bound() && subpass.depth_stencil_attachment.index == attachment
}

/// Computes the full read/write stage and access mask for one subpass's
/// attachment usage, used on the producer side of a derived dependency.
fn write_stages_and_access(subpass: &SubpassInfo) -> (PipelineStages, AccessTypes) {
    let mut stages = PipelineStages::empty();
    let mut access = AccessTypes::empty();
    for color in subpass.color_attachments.iter().filter(|a| a.is_bound()) {
        if !is_depth(subpass, color.index) {
            stages |= PipelineStages::COLOR_OUTPUT;
            access |= AccessTypes::COLOR_ATTACHMENT_WRITE;
        }
    }
    if subpass.depth_stencil_attachment.is_bound() {
        stages |= PipelineStages::PRE_FRAGMENT_SHADER_TESTS | PipelineStages::POST_FRAGMENT_SHADER_TESTS;
        access |= AccessTypes::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }
    (stages, access)
}

/// Computes the full stage and access mask covering every way a subpass
/// touches its attachments, used on the consumer side of a derived
/// dependency — a dependency must order *all* of the consumer's attachment
/// work relative to the producer's write, not just the shared attachment.
fn full_usage_stages_and_access(subpass: &SubpassInfo) -> (PipelineStages, AccessTypes) {
    let (mut stages, mut access) = write_stages_and_access(subpass);
    // A color attachment written this subpass is conservatively treated as
    // read-modify-write, since blend state is backend/pipeline state the
    // render pass description does not see.
    if !subpass.color_attachments.is_empty() {
        access |= AccessTypes::COLOR_ATTACHMENT_READ;
    }
    if subpass.depth_stencil_attachment.is_bound() {
        access |= AccessTypes::DEPTH_STENCIL_ATTACHMENT_READ;
    }
    if !subpass.input_attachments.is_empty() {
        stages |= PipelineStages::FRAGMENT_SHADER;
        access |= AccessTypes::INPUT_ATTACHMENT_READ;
    }
    (stages, access)
}

fn full_access() -> AccessTypes {
    AccessTypes::INPUT_ATTACHMENT_READ
        | AccessTypes::COLOR_ATTACHMENT_READ
        | AccessTypes::COLOR_ATTACHMENT_WRITE
        | AccessTypes::DEPTH_STENCIL_ATTACHMENT_READ
        | AccessTypes::DEPTH_STENCIL_ATTACHMENT_WRITE
}

/// Derives the full default dependency set for `desc`. Only meaningful when
/// `desc.subpass_dependencies` is empty; callers that provide their own
/// dependencies skip this entirely.
pub fn derive_default_dependencies(desc: &RenderPassDescription) -> Vec<SubpassDependency> {
    let usages: Vec<Usage> = desc.subpasses.iter().map(usage_of).collect();
    let referenced: Vec<Vec<u32>> = usages.iter().map(referenced).collect();

    let mut dependencies = Vec::new();
    let mut has_inbound = vec![false; desc.subpasses.len()];
    let mut has_outbound = vec![false; desc.subpasses.len()];

    for i in 1..desc.subpasses.len() {
        for j in 0..i {
            if shares_attachment(&usages[j].written, &referenced[i]) || shares_attachment(&usages[i].written, &referenced[j]) {
                let (src_stages, src_access) = write_stages_and_access(&desc.subpasses[j]);
                let (dst_stages, dst_access) = full_usage_stages_and_access(&desc.subpasses[i]);
                dependencies.push(SubpassDependency {
                    src_subpass: j as u32,
                    dst_subpass: i as u32,
                    src_stages,
                    dst_stages,
                    src_access,
                    dst_access,
                    region_dependency: true,
                });
                has_inbound[i] = true;
                has_outbound[j] = true;
            }
        }
    }

    for (i, subpass) in desc.subpasses.iter().enumerate() {
        if !has_inbound[i] {
            let (dst_stages, dst_access) = full_usage_stages_and_access(subpass);
            dependencies.push(SubpassDependency {
                src_subpass: EXTERNAL_SUBPASS,
                dst_subpass: i as u32,
                src_stages: PipelineStages::ALL_GRAPHICS,
                dst_stages: dst_stages | PipelineStages::ALL_GRAPHICS,
                src_access: full_access(),
                dst_access: dst_access | full_access(),
                region_dependency: false,
            });
        }
        if !has_outbound[i] {
            let (src_stages, src_access) = full_usage_stages_and_access(subpass);
            dependencies.push(SubpassDependency {
                src_subpass: i as u32,
                dst_subpass: EXTERNAL_SUBPASS,
                src_stages: src_stages | PipelineStages::ALL_GRAPHICS,
                dst_stages: PipelineStages::ALL_GRAPHICS,
                src_access: src_access | full_access(),
                dst_access: full_access(),
                region_dependency: false,
            });
        }
    }

    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_pass::types::AttachmentRef;

    fn subpass(name: &str, color: Vec<AttachmentRef>, input: Vec<u32>) -> SubpassInfo {
        SubpassInfo { name: name.into(), input_attachments: input, color_attachments: color, depth_stencil_attachment: AttachmentRef::NONE }
    }

    #[test]
    fn derives_the_documented_producer_consumer_dependency() {
        // S0 writes color attachment 0; S1 reads attachment 0 as input and
        // writes attachment 1 as color.
        let desc = RenderPassDescription {
            attachments: vec![],
            subpasses: vec![
                subpass("s0", vec![AttachmentRef { index: 0, resolve: false }], vec![]),
                subpass("s1", vec![AttachmentRef { index: 1, resolve: false }], vec![0]),
            ],
            subpass_dependencies: vec![],
        };

        let deps = derive_default_dependencies(&desc);
        let direct = deps.iter().find(|d| d.src_subpass == 0 && d.dst_subpass == 1).expect("missing s0->s1 dependency");
        assert_eq!(direct.src_stages, PipelineStages::COLOR_OUTPUT);
        assert_eq!(direct.src_access, AccessTypes::COLOR_ATTACHMENT_WRITE);
        assert_eq!(direct.dst_stages, PipelineStages::FRAGMENT_SHADER | PipelineStages::COLOR_OUTPUT);
        assert_eq!(direct.dst_access, AccessTypes::INPUT_ATTACHMENT_READ | AccessTypes::COLOR_ATTACHMENT_READ | AccessTypes::COLOR_ATTACHMENT_WRITE);
        assert!(direct.region_dependency);

        // No earlier writer for s0, so it gets an implicit EXTERNAL->s0.
        assert!(deps.iter().any(|d| d.src_subpass == EXTERNAL_SUBPASS && d.dst_subpass == 0));
        // No later reader of s1's output, so it gets an implicit s1->EXTERNAL.
        assert!(deps.iter().any(|d| d.src_subpass == 1 && d.dst_subpass == EXTERNAL_SUBPASS));
    }

    #[test]
    fn depth_stencil_producer_covers_both_fragment_test_stages() {
        // S0 writes a depth-stencil attachment; S1 writes a color attachment
        // unrelated to it, so the only dependency exercising depth is S0's
        // implicit EXTERNAL<->S0 pair.
        let mut s0 = subpass("s0", vec![], vec![]);
        s0.depth_stencil_attachment = AttachmentRef { index: 0, resolve: false };
        let desc = RenderPassDescription {
            attachments: vec![],
            subpasses: vec![s0, subpass("s1", vec![AttachmentRef { index: 1, resolve: false }], vec![])],
            subpass_dependencies: vec![],
        };

        let deps = derive_default_dependencies(&desc);
        let inbound = deps.iter().find(|d| d.src_subpass == EXTERNAL_SUBPASS && d.dst_subpass == 0).expect("missing EXTERNAL->s0 dependency");
        assert!(inbound.dst_stages.contains(PipelineStages::PRE_FRAGMENT_SHADER_TESTS));
        assert!(inbound.dst_stages.contains(PipelineStages::POST_FRAGMENT_SHADER_TESTS));

        let outbound = deps.iter().find(|d| d.src_subpass == 0 && d.dst_subpass == EXTERNAL_SUBPASS).expect("missing s0->EXTERNAL dependency");
        assert!(outbound.src_stages.contains(PipelineStages::PRE_FRAGMENT_SHADER_TESTS));
        assert!(outbound.src_stages.contains(PipelineStages::POST_FRAGMENT_SHADER_TESTS));
    }

    #[test]
    fn every_subpass_has_an_inbound_and_outbound_dependency() {
        let desc = RenderPassDescription {
            attachments: vec![],
            subpasses: vec![
                subpass("s0", vec![AttachmentRef { index: 0, resolve: false }], vec![]),
                subpass("s1", vec![AttachmentRef { index: 1, resolve: false }], vec![0]),
                subpass("s2", vec![AttachmentRef { index: 2, resolve: false }], vec![1]),
            ],
            subpass_dependencies: vec![],
        };

        let deps = derive_default_dependencies(&desc);
        for i in 0..desc.subpasses.len() as u32 {
            assert!(deps.iter().any(|d| d.dst_subpass == i), "subpass {i} has no inbound dependency");
            assert!(deps.iter().any(|d| d.src_subpass == i), "subpass {i} has no outbound dependency");
        }

        let mut seen = std::collections::HashSet::new();
        for d in &deps {
            let key = (d.src_subpass, d.dst_subpass, d.region_dependency);
            assert!(seen.insert(key), "duplicate dependency tuple {key:?}");
        }
    }
}

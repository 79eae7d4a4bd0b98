use crate::backend::{BindGroupId, BufferId, PipelineId};
use std::ops::Range;

/// Something that accepts render pass commands.
pub trait PassRecorder {
    fn set_pipeline(&mut self, pipeline: PipelineId);
    fn set_bind_group(&mut self, slot: u32, group: BindGroupId);
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId);
    /// Indices are always `u32`.
    fn set_index_buffer(&mut self, buffer: BufferId);
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassCommand {
    SetPipeline(PipelineId),
    SetBindGroup {
        slot: u32,
        group: BindGroupId,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferId,
    },
    SetIndexBuffer(BufferId),
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
}

/// Commands for one render pass, recorded CPU-side and replayed by the
/// backend on submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<PassCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PassCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PassCommand::DrawIndexed { .. }))
            .count()
    }
}

impl PassRecorder for CommandList {
    fn set_pipeline(&mut self, pipeline: PipelineId) {
        self.commands.push(PassCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, slot: u32, group: BindGroupId) {
        self.commands.push(PassCommand::SetBindGroup { slot, group });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId) {
        self.commands
            .push(PassCommand::SetVertexBuffer { slot, buffer });
    }

    fn set_index_buffer(&mut self, buffer: BufferId) {
        self.commands.push(PassCommand::SetIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.commands.push(PassCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut list = CommandList::new();
        list.set_pipeline(PipelineId(1));
        list.set_bind_group(0, BindGroupId(2));
        list.draw_indexed(0..36, 0, 0..1);
        assert_eq!(list.len(), 3);
        assert_eq!(list.commands()[0], PassCommand::SetPipeline(PipelineId(1)));
        assert_eq!(list.draw_count(), 1);
    }
}

use crate::backend::{
    BindGroupId, BindGroupSource, BufferId, BufferUsage, GpuBackend, PassDesc, PipelineDesc,
    PipelineId, PipelineStatus, TextureData, TextureId,
};
use crate::commands::{CommandList, PassCommand};
use crate::error::{FrameAcquisitionError, InitializationError};
use std::collections::{BTreeMap, BTreeSet};

/// One submitted render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub frame: u64,
    pub pass: PassDesc,
    pub commands: Vec<PassCommand>,
}

/// Headless backend that keeps resources as plain data and records every
/// submission instead of talking to a GPU.
///
/// Used for CLI output and for exercising the renderer in tests. Failure
/// knobs are public fields.
#[derive(Debug)]
pub struct RecordingBackend {
    pub output_size: (u32, u32),
    /// Returned by every `acquire_frame` while set.
    pub fail_acquire: Option<FrameAcquisitionError>,
    /// Make `create_pipeline` fail.
    pub fail_pipelines: bool,
    /// Status given to newly created pipelines.
    pub new_pipeline_status: PipelineStatus,
    next_id: u64,
    frames: u64,
    buffers: BTreeMap<BufferId, (BufferUsage, Vec<u8>)>,
    textures: BTreeSet<TextureId>,
    bind_groups: BTreeMap<BindGroupId, BindGroupSource>,
    pipelines: BTreeMap<PipelineId, (PipelineDesc, PipelineStatus)>,
    depth_target: Option<(u32, u32)>,
    depth_recreations: u32,
    submissions: Vec<Submission>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            output_size: (width, height),
            fail_acquire: None,
            fail_pipelines: false,
            new_pipeline_status: PipelineStatus::Ready,
            next_id: 1,
            frames: 0,
            buffers: BTreeMap::new(),
            textures: BTreeSet::new(),
            bind_groups: BTreeMap::new(),
            pipelines: BTreeMap::new(),
            depth_target: None,
            depth_recreations: 0,
            submissions: Vec::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn set_pipeline_status(&mut self, pipeline: PipelineId, status: PipelineStatus) {
        if let Some(entry) = self.pipelines.get_mut(&pipeline) {
            entry.1 = status;
        }
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|(_, data)| data.as_slice())
    }

    pub fn bind_group_source(&self, group: BindGroupId) -> Option<&BindGroupSource> {
        self.bind_groups.get(&group)
    }

    pub fn depth_target(&self) -> Option<(u32, u32)> {
        self.depth_target
    }

    pub fn depth_recreations(&self) -> u32 {
        self.depth_recreations
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_bind_groups(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Human-readable listing of the last submission.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let Some(last) = self.submissions.last() else {
            out.push_str("=== no submissions ===\n");
            return out;
        };
        out.push_str(&format!(
            "=== Frame {} ({} commands, {} draws) ===\n",
            last.frame,
            last.commands.len(),
            last.commands
                .iter()
                .filter(|c| matches!(c, PassCommand::DrawIndexed { .. }))
                .count()
        ));
        let [r, g, b, a] = last.pass.clear_color;
        out.push_str(&format!(
            "clear color=({r:.2}, {g:.2}, {b:.2}, {a:.2}) depth={:.1}\n",
            last.pass.clear_depth
        ));
        for command in &last.commands {
            let line = match command {
                PassCommand::SetPipeline(p) => {
                    let label = self
                        .pipelines
                        .get(p)
                        .map(|(desc, _)| desc.label.as_str())
                        .unwrap_or("?");
                    format!("  set_pipeline {} ({label})", p.0)
                }
                PassCommand::SetBindGroup { slot, group } => {
                    format!("  set_bind_group slot={slot} group={}", group.0)
                }
                PassCommand::SetVertexBuffer { slot, buffer } => {
                    format!("  set_vertex_buffer slot={slot} buffer={}", buffer.0)
                }
                PassCommand::SetIndexBuffer(buffer) => {
                    format!("  set_index_buffer buffer={}", buffer.0)
                }
                PassCommand::DrawIndexed {
                    indices,
                    base_vertex,
                    instances,
                } => format!(
                    "  draw_indexed indices={indices:?} base_vertex={base_vertex} instances={instances:?}"
                ),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

impl GpuBackend for RecordingBackend {
    type Frame = u64;

    fn output_size(&self) -> (u32, u32) {
        self.output_size
    }

    fn resize_depth_target(&mut self, width: u32, height: u32) {
        self.depth_target = Some((width.max(1), height.max(1)));
        self.depth_recreations += 1;
    }

    fn release_depth_target(&mut self) {
        self.depth_target = None;
    }

    fn create_buffer(&mut self, _label: &str, usage: BufferUsage, contents: &[u8]) -> BufferId {
        let id = BufferId(self.next_id());
        self.buffers.insert(id, (usage, contents.to_vec()));
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        if let Some((_, contents)) = self.buffers.get_mut(&buffer) {
            contents.clear();
            contents.extend_from_slice(data);
        }
    }

    fn create_texture(&mut self, _label: &str, _data: &TextureData) -> TextureId {
        let id = TextureId(self.next_id());
        self.textures.insert(id);
        id
    }

    fn create_bind_group(&mut self, _label: &str, source: &BindGroupSource) -> BindGroupId {
        let id = BindGroupId(self.next_id());
        self.bind_groups.insert(id, source.clone());
        id
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineId, InitializationError> {
        if self.fail_pipelines {
            return Err(InitializationError::Pipeline(format!(
                "{}: rejected by recording backend",
                desc.label
            )));
        }
        let id = PipelineId(self.next_id());
        self.pipelines
            .insert(id, (desc.clone(), self.new_pipeline_status.clone()));
        Ok(id)
    }

    fn pipeline_status(&mut self, pipeline: PipelineId) -> PipelineStatus {
        self.pipelines
            .get(&pipeline)
            .map(|(_, status)| status.clone())
            .unwrap_or_else(|| PipelineStatus::Failed("unknown pipeline".into()))
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn release_bind_group(&mut self, group: BindGroupId) {
        self.bind_groups.remove(&group);
    }

    fn release_pipeline(&mut self, pipeline: PipelineId) {
        self.pipelines.remove(&pipeline);
    }

    fn acquire_frame(&mut self) -> Result<u64, FrameAcquisitionError> {
        if let Some(err) = &self.fail_acquire {
            return Err(err.clone());
        }
        self.frames += 1;
        Ok(self.frames)
    }

    fn submit(&mut self, frame: u64, pass: &PassDesc, commands: &CommandList) {
        self.submissions.push(Submission {
            frame,
            pass: *pass,
            commands: commands.commands().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::PassRecorder;

    #[test]
    fn dump_without_submissions() {
        let backend = RecordingBackend::new(10, 10);
        assert!(backend.dump().contains("no submissions"));
    }

    #[test]
    fn dump_lists_commands() {
        let mut backend = RecordingBackend::new(10, 10);
        let frame = backend.acquire_frame().unwrap();
        let mut list = CommandList::new();
        list.set_bind_group(0, BindGroupId(5));
        list.draw_indexed(0..6, 0, 0..1);
        backend.submit(
            frame,
            &PassDesc {
                clear_color: [0.1, 0.1, 0.15, 1.0],
                clear_depth: 1.0,
            },
            &list,
        );
        let out = backend.dump();
        assert!(out.contains("Frame 1"));
        assert!(out.contains("1 draws"));
        assert!(out.contains("set_bind_group slot=0 group=5"));
    }

    #[test]
    fn released_ids_are_forgotten() {
        let mut backend = RecordingBackend::new(10, 10);
        let buf = backend.create_buffer("b", BufferUsage::Uniform, &[1, 2, 3]);
        assert_eq!(backend.buffer_contents(buf), Some(&[1u8, 2, 3][..]));
        backend.release_buffer(buf);
        backend.release_buffer(buf);
        assert_eq!(backend.live_buffers(), 0);
        backend.write_buffer(buf, &[9]);
        assert!(backend.buffer_contents(buf).is_none());
    }

    #[test]
    fn acquire_failure_is_repeatable() {
        let mut backend = RecordingBackend::new(10, 10);
        backend.fail_acquire = Some(FrameAcquisitionError::Timeout);
        assert_eq!(backend.acquire_frame(), Err(FrameAcquisitionError::Timeout));
        assert_eq!(backend.acquire_frame(), Err(FrameAcquisitionError::Timeout));
    }
}

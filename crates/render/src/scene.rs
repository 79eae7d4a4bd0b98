use crate::material::MaterialId;
use crate::mesh::GpuMesh;
use scenery_common::{DrawableId, Transform};

/// One renderable instance. Missing mesh or material means the drawable is
/// skipped for the frame.
///
/// `clone` keeps the id. Use [`Drawable::instance`] for a second, separately
/// placed copy; a renderer draws each id once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub id: DrawableId,
    pub mesh: Option<GpuMesh>,
    pub material: Option<MaterialId>,
    pub transform: Transform,
}

impl Drawable {
    pub fn new(mesh: GpuMesh, material: MaterialId, transform: Transform) -> Self {
        Self {
            id: DrawableId::new(),
            mesh: Some(mesh),
            material: Some(material),
            transform,
        }
    }

    /// Same mesh and material under a fresh id.
    pub fn instance(&self, transform: Transform) -> Self {
        Self {
            id: DrawableId::new(),
            mesh: self.mesh,
            material: self.material,
            transform,
        }
    }
}

/// Source of drawables for a frame. Iteration order is draw order.
///
/// Transforms must not change while a frame is being recorded; updates
/// from other threads hand over a snapshot before `render_frame`.
pub trait Scene {
    fn drawables(&self) -> impl Iterator<Item = &Drawable>;
}

impl Scene for [Drawable] {
    fn drawables(&self) -> impl Iterator<Item = &Drawable> {
        self.iter()
    }
}

impl Scene for Vec<Drawable> {
    fn drawables(&self) -> impl Iterator<Item = &Drawable> {
        self.iter()
    }
}

/// Ordered list of drawables.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    drawables: Vec<Drawable>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `drawable`. An id already in the graph is replaced by a fresh
    /// one; the returned id is the one stored.
    pub fn add(&mut self, mut drawable: Drawable) -> DrawableId {
        if self.get(drawable.id).is_some() {
            let fresh = DrawableId::new();
            tracing::debug!(duplicate = %drawable.id, id = %fresh, "drawable id already in scene, reassigned");
            drawable.id = fresh;
        }
        let id = drawable.id;
        self.drawables.push(drawable);
        id
    }

    pub fn remove(&mut self, id: DrawableId) -> Option<Drawable> {
        let index = self.drawables.iter().position(|d| d.id == id)?;
        Some(self.drawables.remove(index))
    }

    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
        self.drawables.iter_mut().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

impl Scene for SceneGraph {
    fn drawables(&self) -> impl Iterator<Item = &Drawable> {
        self.drawables.iter()
    }
}

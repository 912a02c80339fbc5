use bytemuck::{Pod, Zeroable};

/// Which host canvas a render record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CanvasLayer {
    Field = 0,
    Dust = 1,
    Unlock = 2,
    Pollen = 3,
}

/// A filled circle in HSLA. 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct DotInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Hue in degrees.
    pub hue: f32,
    /// Saturation in percent.
    pub saturation: f32,
    /// Lightness in percent.
    pub lightness: f32,
    pub alpha: f32,
    /// `CanvasLayer` as f32.
    pub layer: f32,
}

impl DotInstance {
    pub const FLOATS: usize = 8;
}

/// A straight stroke between two points. 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LinkInstance {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub hue: f32,
    pub alpha: f32,
    pub layer: f32,
}

impl LinkInstance {
    pub const FLOATS: usize = 8;
}

/// Per-frame render output of every simulation, read by the host through raw pointers.
pub struct SceneBuffer {
    pub dots: Vec<DotInstance>,
    pub links: Vec<LinkInstance>,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self::with_capacity(1024, 512)
    }

    pub fn with_capacity(dots: usize, links: usize) -> Self {
        Self {
            dots: Vec::with_capacity(dots),
            links: Vec::with_capacity(links),
        }
    }

    pub fn clear(&mut self) {
        self.dots.clear();
        self.links.clear();
    }

    pub fn push_dot(&mut self, dot: DotInstance) {
        self.dots.push(dot);
    }

    pub fn push_link(&mut self, link: LinkInstance) {
        self.links.push(link);
    }

    pub fn dot_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.dots)
    }

    pub fn link_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.links)
    }

    pub fn dot_count(&self) -> u32 {
        self.dots.len() as u32
    }

    pub fn link_count(&self) -> u32 {
        self.links.len() as u32
    }

    /// Dots on one layer (test and debug helper).
    pub fn dots_on(&self, layer: CanvasLayer) -> impl Iterator<Item = &DotInstance> {
        let tag = layer as u8 as f32;
        self.dots.iter().filter(move |d| d.layer == tag)
    }

    pub fn links_on(&self, layer: CanvasLayer) -> impl Iterator<Item = &LinkInstance> {
        let tag = layer as u8 as f32;
        self.links.iter().filter(move |l| l.layer == tag)
    }
}

impl Default for SceneBuffer {
    fn default() -> Self {
        Self::new()
    }
}

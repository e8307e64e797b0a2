//! Opaque rendering resources and the backend boundary that owns them.
//!
//! The core never looks inside a resource. Nodes acquire handles through a [`ResourceBackend`]
//! and the workspace guarantees `release` is called exactly once when the owning node goes
//! away.

use hashbrown::HashMap;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Texture,
    Framebuffer,
    Sampler,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub id: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ResourceHandle {
    pub fn new(kind: ResourceKind, id: u64) -> Self {
        Self {
            kind,
            id,
            width: 0,
            height: 0,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Parameters for [`ResourceBackend::acquire`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceParams {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("backend cannot allocate {kind:?} of {width}x{height}")]
    Unsupported {
        kind: ResourceKind,
        width: u32,
        height: u32,
    },
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Boundary to the rendering backend.
pub trait ResourceBackend {
    fn acquire(
        &mut self,
        kind: ResourceKind,
        params: ResourceParams,
    ) -> Result<ResourceHandle, ResourceError>;

    fn release(&mut self, handle: ResourceHandle);
}

/// Backend without a GPU: hands out ids and tracks which ones are alive.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: HashMap<u64, ResourceHandle>,
    acquired: usize,
    released: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles acquired so far.
    pub fn acquired(&self) -> usize {
        self.acquired
    }

    /// Number of handles released so far.
    pub fn released(&self) -> usize {
        self.released
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: &ResourceHandle) -> bool {
        self.live.contains_key(&handle.id)
    }
}

impl ResourceBackend for HeadlessBackend {
    fn acquire(
        &mut self,
        kind: ResourceKind,
        params: ResourceParams,
    ) -> Result<ResourceHandle, ResourceError> {
        if matches!(kind, ResourceKind::Texture | ResourceKind::Framebuffer)
            && (params.width == 0 || params.height == 0)
        {
            return Err(ResourceError::Unsupported {
                kind,
                width: params.width,
                height: params.height,
            });
        }
        self.next_id += 1;
        let handle = ResourceHandle::new(kind, self.next_id).with_size(params.width, params.height);
        self.live.insert(handle.id, handle.clone());
        self.acquired += 1;
        Ok(handle)
    }

    fn release(&mut self, handle: ResourceHandle) {
        if self.live.remove(&handle.id).is_some() {
            self.released += 1;
        } else {
            warn!("release of unknown resource {:?} #{}", handle.kind, handle.id);
        }
    }
}

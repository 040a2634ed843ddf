use crate::error::RenderError;
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Transform state visible to a draw call at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawState {
    pub projection: Mat4,
    pub model_view: Mat4,
}

impl DrawState {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.model_view
    }
}

/// Render state shared by everything drawn in a frame: the active projection
/// and the model-view transform stack.
///
/// The stack is never empty; its base entry is identity. Pushed transforms
/// only become visible to draws after [`RenderContext::apply_model_view`].
///
/// # Invariants
/// - Every push is matched by exactly one pop before the pusher returns.
///   [`ModelViewScope`] and [`ProjectionScope`] enforce this structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    projection: Mat4,
    model_view: Vec<Mat4>,
    applied: Mat4,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::with_projection(Mat4::IDENTITY)
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection(projection: Mat4) -> Self {
        Self {
            projection,
            model_view: vec![Mat4::IDENTITY],
            applied: Mat4::IDENTITY,
        }
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Duplicate the top transform so it can be modified locally.
    pub fn push(&mut self) {
        let top = self.top();
        self.model_view.push(top);
    }

    pub fn pop(&mut self) -> Result<(), RenderError> {
        if self.model_view.len() <= 1 {
            return Err(RenderError::StackUnderflow);
        }
        self.model_view.pop();
        Ok(())
    }

    pub fn load_identity(&mut self) {
        *self.top_mut() = Mat4::IDENTITY;
    }

    /// Post-multiply the top transform: `top = top * m`.
    pub fn multiply(&mut self, m: Mat4) {
        let top = self.top_mut();
        *top *= m;
    }

    pub fn top(&self) -> Mat4 {
        self.model_view.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Number of entries on the model-view stack, base included.
    pub fn depth(&self) -> usize {
        self.model_view.len()
    }

    /// Make the current top transform visible to subsequent draws.
    pub fn apply_model_view(&mut self) {
        self.applied = self.top();
    }

    pub fn applied_model_view(&self) -> Mat4 {
        self.applied
    }

    pub fn draw_state(&self) -> DrawState {
        DrawState {
            projection: self.projection,
            model_view: self.applied,
        }
    }

    /// Push a model-view frame that is popped (and the restored top
    /// re-applied) when the returned scope is dropped.
    pub fn push_scope(&mut self) -> ModelViewScope<'_> {
        let entry_depth = self.depth();
        self.push();
        ModelViewScope {
            ctx: self,
            entry_depth,
        }
    }

    /// Install `projection` until the returned scope is dropped, then restore
    /// the projection that was active before.
    pub fn swap_projection(&mut self, projection: Mat4) -> ProjectionScope<'_> {
        let saved = self.projection;
        self.projection = projection;
        ProjectionScope { ctx: self, saved }
    }

    fn top_mut(&mut self) -> &mut Mat4 {
        if self.model_view.is_empty() {
            self.model_view.push(Mat4::IDENTITY);
        }
        let last = self.model_view.len() - 1;
        &mut self.model_view[last]
    }
}

/// Guard for one pushed model-view frame.
///
/// On drop the stack is truncated back to its depth before the push, so
/// frames left behind by code running inside the scope are discarded too,
/// and the restored top is re-applied.
pub struct ModelViewScope<'a> {
    ctx: &'a mut RenderContext,
    entry_depth: usize,
}

impl Deref for ModelViewScope<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        &*self.ctx
    }
}

impl DerefMut for ModelViewScope<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        &mut *self.ctx
    }
}

impl Drop for ModelViewScope<'_> {
    fn drop(&mut self) {
        self.ctx.model_view.truncate(self.entry_depth.max(1));
        self.ctx.apply_model_view();
    }
}

/// Guard for a temporarily installed projection matrix.
pub struct ProjectionScope<'a> {
    ctx: &'a mut RenderContext,
    saved: Mat4,
}

impl ProjectionScope<'_> {
    /// The projection that will be restored on drop.
    pub fn saved(&self) -> Mat4 {
        self.saved
    }
}

impl Deref for ProjectionScope<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        &*self.ctx
    }
}

impl DerefMut for ProjectionScope<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        &mut *self.ctx
    }
}

impl Drop for ProjectionScope<'_> {
    fn drop(&mut self) {
        self.ctx.projection = self.saved;
    }
}

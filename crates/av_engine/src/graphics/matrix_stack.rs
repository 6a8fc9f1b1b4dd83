//! 4x4 matrix stack for hierarchical transforms
//!
//! The stack always holds at least one matrix; the topmost is the current
//! transform. Push duplicates the top, pop discards it. Pops that would
//! empty the stack fail, which is how unbalanced draw callbacks are caught
//! at frame end.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// A stack of 4x4 matrices
#[derive(Debug, Clone)]
pub struct MatrixStack {
    stack: Vec<Mat4>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    /// Create a stack holding a single identity matrix
    pub fn new() -> Self {
        Self { stack: vec![Mat4::identity()] }
    }

    /// Current stack depth (always >= 1)
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The current (topmost) matrix
    pub fn top(&self) -> Mat4 {
        *self.stack.last().expect("matrix stack is never empty")
    }

    /// Duplicate the top matrix
    pub fn push(&mut self) {
        let top = self.top();
        self.stack.push(top);
    }

    /// Discard the top matrix; fails when only the base matrix remains
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Replace the top matrix
    pub fn load(&mut self, m: Mat4) {
        *self.stack.last_mut().expect("matrix stack is never empty") = m;
    }

    /// Reset to a single identity matrix
    pub fn clear(&mut self) {
        self.stack.clear();
        self.stack.push(Mat4::identity());
    }

    /// Right-multiply the top matrix
    pub fn mult(&mut self, m: Mat4) {
        let top = self.top();
        self.load(top * m);
    }

    /// Apply a translation to the top matrix
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.mult(Mat4::new_translation(&Vec3::new(x, y, z)));
    }

    /// Apply a rotation (degrees, arbitrary axis) to the top matrix
    pub fn rotate(&mut self, angle_deg: f32, x: f32, y: f32, z: f32) {
        self.mult(Mat4::rotation_deg(angle_deg, Vec3::new(x, y, z)));
    }

    /// Apply a non-uniform scale to the top matrix
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.mult(Mat4::new_nonuniform_scaling(&Vec3::new(x, y, z)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn push_pop_restores_top() {
        let mut stack = MatrixStack::new();
        stack.translate(1.0, 2.0, 3.0);
        let before = stack.top();

        stack.push();
        stack.translate(10.0, 0.0, 0.0);
        assert!(stack.pop());

        let after = stack.top();
        assert_relative_eq!((before - after).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn pop_past_base_fails() {
        let mut stack = MatrixStack::new();
        assert!(!stack.pop());
        stack.push();
        assert!(stack.pop());
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn transforms_compose_in_order() {
        let mut stack = MatrixStack::new();
        stack.translate(1.0, 0.0, 0.0);
        stack.scale(2.0, 2.0, 2.0);
        let p = stack.top() * crate::foundation::math::Vec4::new(1.0, 0.0, 0.0, 1.0);
        // Scale applies first in local space, then the translation.
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-6);
    }
}

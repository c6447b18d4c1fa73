//! Pure traversal bookkeeping: the state-table stack, the per-input
//! uniform stacks, and draw-call planning. Nothing here touches GL, so the
//! pre-order/post-order contract is testable on its own.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::shape::VertexRange;
use crate::statetable::StateTable;
use crate::uniform::Uniform;

/// Maintains the merged pipeline state during a depth-first walk.
///
/// `push` composes a node's table over the current state; `pop` restores
/// exactly the entries the node had set, from a snapshot taken at push
/// time. Frame-scoped values (clears, write masks, scissor) are never
/// restored, so they always belong to the outermost table that set them.
pub struct StateStack {
    current: StateTable,
    // Snapshot of `current` before the merge, plus the node's own table so
    // the restore knows which entries to copy back.
    saved: Vec<(StateTable, StateTable)>,
}

impl StateStack {
    pub fn new(base: StateTable) -> Self {
        StateStack {
            current: base,
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> &StateTable {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut StateTable {
        &mut self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push(&mut self, table: &StateTable) {
        let snapshot = self.current.clone();
        self.current.merge_values_from(table, table);
        self.saved.push((snapshot, table.clone()));
    }

    pub fn pop(&mut self) {
        if let Some((snapshot, table)) = self.saved.pop() {
            self.current.merge_non_clear_values_from(&snapshot, &table);
        } else {
            warn!("State stack pop without a matching push, ignoring.");
        }
    }
}

/// One stack of merged values per declared shader input.
///
/// Pushing a uniform merges it over the input's current top, so a child's
/// partial array write composes with an ancestor's run; popping uncovers
/// the ancestor's value untouched.
#[derive(Default)]
pub struct UniformStack {
    stacks: HashMap<(u64, usize), Vec<Uniform>>,
}

impl UniformStack {
    pub fn new() -> Self {
        UniformStack::default()
    }

    fn key(uniform: &Uniform) -> Option<(u64, usize)> {
        uniform
            .registry()
            .map(|r| (r.id(), uniform.registry_index()))
    }

    pub fn push(&mut self, uniform: &Uniform) {
        let key = match Self::key(uniform) {
            Some(key) => key,
            None => return,
        };
        let stack = self.stacks.entry(key).or_insert_with(Vec::new);
        let merged = match stack.last() {
            Some(top) => {
                let mut merged = top.clone();
                merged.merge_values_from(uniform);
                merged
            }
            None => uniform.clone(),
        };
        stack.push(merged);
    }

    pub fn pop(&mut self, uniform: &Uniform) {
        if let Some(key) = Self::key(uniform) {
            if let Some(stack) = self.stacks.get_mut(&key) {
                stack.pop();
            }
        }
    }

    /// The current top of every input that has one, in no particular order.
    pub fn tops(&self) -> impl Iterator<Item = &Uniform> {
        self.stacks.values().filter_map(|stack| stack.last())
    }

    /// The merged value currently in effect for `uniform`'s input.
    pub fn current(&self, uniform: &Uniform) -> Option<&Uniform> {
        Self::key(uniform)
            .and_then(|key| self.stacks.get(&key))
            .and_then(|stack| stack.last())
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.values().all(|stack| stack.is_empty())
    }
}

/// A single planned GL draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawCall {
    Arrays {
        first: i32,
        count: i32,
    },
    ArraysInstanced {
        first: i32,
        count: i32,
        instances: i32,
    },
    /// `offset` is in bytes into the bound index buffer.
    Elements {
        count: i32,
        offset: usize,
    },
    ElementsInstanced {
        count: i32,
        offset: usize,
        instances: i32,
    },
}

/// Plans the draw calls for one shape.
///
/// Enabled vertex ranges each become a call; without ranges a single call
/// covers `default_count` vertices or indices. A zero instance count means
/// a plain call; any other value, 1 included, asks for an instanced call,
/// which degrades to a plain one with a warning when instanced drawing is
/// unavailable. `index_byte_size` is 0 for non-indexed shapes.
pub fn plan_draw_calls(
    ranges: &[VertexRange],
    default_count: usize,
    default_instances: u32,
    index_byte_size: usize,
    instancing_available: bool,
) -> SmallVec<[DrawCall; 4]> {
    let mut calls = SmallVec::new();

    let mut plan = |start: usize, count: usize, instances: u32| {
        if count == 0 {
            return;
        }
        let instances = if instances != 0 && !instancing_available {
            warn!("Instanced drawing is unavailable, drawing one instance.");
            0
        } else {
            instances
        };
        let call = if index_byte_size != 0 {
            let offset = start * index_byte_size;
            if instances != 0 {
                DrawCall::ElementsInstanced {
                    count: count as i32,
                    offset,
                    instances: instances as i32,
                }
            } else {
                DrawCall::Elements {
                    count: count as i32,
                    offset,
                }
            }
        } else if instances != 0 {
            DrawCall::ArraysInstanced {
                first: start as i32,
                count: count as i32,
                instances: instances as i32,
            }
        } else {
            DrawCall::Arrays {
                first: start as i32,
                count: count as i32,
            }
        };
        calls.push(call);
    };

    if ranges.is_empty() {
        plan(0, default_count, default_instances);
    } else {
        for range in ranges.iter().filter(|r| r.enabled) {
            plan(range.start, range.count, range.instance_count);
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rect;
    use crate::registry::{InputKind, ShaderInputRegistry};
    use crate::statetable::Capability;
    use crate::uniform::{UniformValues, ValueType};

    #[test]
    fn child_state_is_restored_after_pop() {
        let mut stack = StateStack::new(StateTable::new(100, 100));

        let mut parent = StateTable::default();
        parent.set_line_width(2.0);
        parent.enable(Capability::Blend, true);

        let mut child = StateTable::default();
        child.set_line_width(5.0);
        child.enable(Capability::Blend, false);

        stack.push(&parent);
        assert_eq!(stack.current().line_width(), 2.0);
        assert!(stack.current().is_enabled(Capability::Blend));

        stack.push(&child);
        assert_eq!(stack.current().line_width(), 5.0);
        assert!(!stack.current().is_enabled(Capability::Blend));

        stack.pop();
        assert_eq!(stack.current().line_width(), 2.0);
        assert!(stack.current().is_enabled(Capability::Blend));
    }

    #[test]
    fn sibling_state_does_not_leak() {
        let mut stack = StateStack::new(StateTable::new(100, 100));

        let mut first = StateTable::default();
        first.set_cull_face_mode(crate::statetable::CullFaceMode::Front);
        stack.push(&first);
        stack.pop();

        // The second sibling sets nothing; it must observe the base state.
        let second = StateTable::default();
        stack.push(&second);
        assert_eq!(
            stack.current().cull_face_mode(),
            crate::statetable::CullFaceMode::Back
        );
        stack.pop();
    }

    #[test]
    fn frame_values_survive_pop() {
        let mut stack = StateStack::new(StateTable::new(100, 100));

        let mut node = StateTable::default();
        node.set_scissor_box(Rect::new(5, 5, 10, 10));
        node.set_line_width(3.0);

        stack.push(&node);
        stack.pop();

        // Non-frame values are restored, frame values stick.
        assert_eq!(stack.current().line_width(), 1.0);
        assert_eq!(stack.current().scissor_box(), Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn uniform_stack_merges_partial_array_writes() {
        let registry = ShaderInputRegistry::new();
        registry.add("uWeights", InputKind::Uniform, ValueType::Float, "");

        let base = registry
            .create_array_uniform("uWeights", 0, UniformValues::Float(vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        let patch = registry
            .create_array_uniform("uWeights", 2, UniformValues::Float(vec![30.0, 40.0, 50.0, 60.0]))
            .unwrap();

        let mut stack = UniformStack::new();
        stack.push(&base);
        stack.push(&patch);

        let merged = stack.current(&base).unwrap();
        assert_eq!(merged.array_index(), 0);
        match merged.values() {
            UniformValues::Float(v) => {
                assert_eq!(v, &[1.0, 2.0, 30.0, 40.0, 50.0, 60.0])
            }
            other => panic!("unexpected values {:?}", other),
        }

        stack.pop(&patch);
        assert_eq!(stack.current(&base).unwrap(), &base);
        stack.pop(&base);
        assert!(stack.is_empty());
    }

    #[test]
    fn draw_plan_ranges_and_instancing() {
        let ranges = [
            VertexRange {
                start: 0,
                count: 6,
                enabled: true,
                instance_count: 0,
            },
            VertexRange {
                start: 6,
                count: 6,
                enabled: false,
                instance_count: 0,
            },
            VertexRange {
                start: 12,
                count: 3,
                enabled: true,
                instance_count: 1,
            },
        ];

        let calls = plan_draw_calls(&ranges, 15, 0, 2, true);
        assert_eq!(
            calls.as_slice(),
            &[
                DrawCall::Elements { count: 6, offset: 0 },
                DrawCall::ElementsInstanced {
                    count: 3,
                    offset: 24,
                    instances: 1
                },
            ]
        );

        // Without ranges the whole shape draws in one call.
        let calls = plan_draw_calls(&[], 15, 4, 0, true);
        assert_eq!(
            calls.as_slice(),
            &[DrawCall::ArraysInstanced {
                first: 0,
                count: 15,
                instances: 4
            }]
        );

        // Instancing degrades to a plain call when unavailable.
        let calls = plan_draw_calls(&[], 15, 4, 0, false);
        assert_eq!(
            calls.as_slice(),
            &[DrawCall::Arrays { first: 0, count: 15 }]
        );
    }
}

//! Per-thread resolution stack used to detect dependency cycles.

use std::any::TypeId;
use std::cell::RefCell;

use crate::error::{DiError, DiResult};

thread_local! {
    static STACK: RefCell<Vec<(TypeId, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a type as under construction on the current thread.
///
/// Entering a type that is already on the stack fails with
/// [`DiError::CircularDependency`]. The entry is popped on drop, including
/// when a factory returns early with an error.
pub(crate) struct ResolutionGuard {
    _private: (),
}

impl ResolutionGuard {
    pub(crate) fn enter(type_id: TypeId, type_name: &'static str) -> DiResult<Self> {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().position(|(id, _)| *id == type_id) {
                let chain = stack
                    .iter()
                    .skip(pos)
                    .map(|(_, name)| *name)
                    .chain(std::iter::once(type_name))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DiError::CircularDependency { chain });
            }
            stack.push((type_id, type_name));
            Ok(Self { _private: () })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

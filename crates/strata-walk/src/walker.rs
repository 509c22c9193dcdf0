//! Depth-first structure walker
//!
//! Finds every value matching a target predicate inside nested mappings and
//! sequences and hands the visitor a [`Slot`] through which the value can be
//! replaced in place. Mutation is always in place through `&mut`; nothing is
//! copied.

use crate::error::{VisitError, WalkError};
use crate::value::{render_path, Location, Walkable};

/// Default nesting bound
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Addressable location of a matched value
#[derive(Debug)]
pub struct Slot<'a, V> {
    path: &'a [Location],
    location: &'a Location,
    value: &'a mut V,
}

impl<V> Slot<'_, V> {
    /// Path of the container holding the value, from the root
    #[inline]
    #[must_use]
    pub fn container_path(&self) -> &[Location] {
        self.path
    }

    /// Key or index of the value inside its container
    #[inline]
    #[must_use]
    pub fn location(&self) -> &Location {
        self.location
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &V {
        &*self.value
    }

    /// Mutable access to the value
    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut *self.value
    }

    /// Replace the value, returning the previous one
    #[inline]
    pub fn replace(&mut self, new: V) -> V {
        std::mem::replace(self.value, new)
    }

    /// Full path of the value, e.g. `$.a[1].b`
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}{}", render_path(self.path), self.location)
    }
}

/// Walker options
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    /// Maximum container nesting before the walk is aborted
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Generic recursive visitor over nested structures
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureWalker {
    options: WalkOptions,
}

impl StructureWalker {
    /// Create walker with default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create walker with explicit options
    #[inline]
    #[must_use]
    pub fn with_options(options: WalkOptions) -> Self {
        Self { options }
    }

    /// With max nesting depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Walk `structure`, calling `visit` for every value matching `target`
    ///
    /// Matching values are not descended into. Mapping keys are never
    /// matched. The root itself is treated as a container, not a candidate.
    ///
    /// # Returns
    /// Number of values visited
    ///
    /// # Errors
    /// - [`WalkError::StructuralCycle`] when a non-empty container lies deeper
    ///   than the depth bound
    /// - [`WalkError::Visit`] when `visit` fails; the walk stops there
    pub fn walk<V, F, E, M>(
        &self,
        structure: &mut V,
        mut visit: F,
        target: M,
    ) -> Result<usize, WalkError>
    where
        V: Walkable,
        F: FnMut(Slot<'_, V>) -> Result<(), E>,
        E: Into<VisitError>,
        M: Fn(&V) -> bool,
    {
        let mut path = Vec::new();
        let mut visited = 0;
        self.walk_container(structure, &mut path, &mut visit, &target, &mut visited)?;
        Ok(visited)
    }

    /// Like [`walk`](Self::walk) but takes and returns the structure by value
    ///
    /// # Errors
    /// Same as [`walk`](Self::walk).
    pub fn walk_owned<V, F, E, M>(
        &self,
        mut structure: V,
        visit: F,
        target: M,
    ) -> Result<V, WalkError>
    where
        V: Walkable,
        F: FnMut(Slot<'_, V>) -> Result<(), E>,
        E: Into<VisitError>,
        M: Fn(&V) -> bool,
    {
        self.walk(&mut structure, visit, target)?;
        Ok(structure)
    }

    fn walk_container<V, F, E, M>(
        &self,
        container: &mut V,
        path: &mut Vec<Location>,
        visit: &mut F,
        target: &M,
        visited: &mut usize,
    ) -> Result<(), WalkError>
    where
        V: Walkable,
        F: FnMut(Slot<'_, V>) -> Result<(), E>,
        E: Into<VisitError>,
        M: Fn(&V) -> bool,
    {
        let Some(entries) = container.entries_mut() else {
            return Ok(());
        };
        let mut entries = entries.peekable();
        if entries.peek().is_some() && path.len() >= self.options.max_depth {
            return Err(WalkError::StructuralCycle {
                limit: self.options.max_depth,
                path: render_path(path),
            });
        }

        for (location, value) in entries {
            if target(&*value) {
                let slot = Slot {
                    path: path.as_slice(),
                    location: &location,
                    value,
                };
                visit(slot).map_err(|e| WalkError::Visit {
                    path: format!("{}{location}", render_path(path)),
                    source: e.into(),
                })?;
                *visited += 1;
            } else {
                path.push(location);
                self.walk_container(value, path, visit, target, visited)?;
                path.pop();
            }
        }
        Ok(())
    }
}

/// Walk with default options
///
/// # Errors
/// See [`StructureWalker::walk`].
pub fn walk<V, F, E, M>(structure: &mut V, visit: F, target: M) -> Result<usize, WalkError>
where
    V: Walkable,
    F: FnMut(Slot<'_, V>) -> Result<(), E>,
    E: Into<VisitError>,
    M: Fn(&V) -> bool,
{
    StructureWalker::new().walk(structure, visit, target)
}

//! Discovery of directories that embedders search for language resources.

use std::path::{Path, PathBuf};

use super::Runtime;

/// Contributes search roots when asked.
pub trait Locator: Send + Sync {
    fn locate(&self, response: &mut LocatorResponse);
}

/// Collects the roots reported by locators, keeping first-seen order.
#[derive(Debug, Default)]
pub struct LocatorResponse {
    roots: Vec<PathBuf>,
}

impl LocatorResponse {
    pub fn register_search_root(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn into_roots(self) -> Vec<PathBuf> {
        self.roots
    }
}

/// Locator roots in registration order, then configured roots. Duplicates keep
/// their first position.
pub fn search_roots(runtime: &Runtime) -> Vec<PathBuf> {
    let mut response = LocatorResponse::default();
    for locator in runtime.locators() {
        locator.locate(&mut response);
    }
    for root in &runtime.config().search_roots {
        response.register_search_root(root.clone());
    }
    response.into_roots()
}

/// First existing `relative` path under the runtime's search roots.
pub fn find_in_search_roots(runtime: &Runtime, relative: impl AsRef<Path>) -> Option<PathBuf> {
    let relative = relative.as_ref();
    search_roots(runtime)
        .into_iter()
        .map(|root| root.join(relative))
        .find(|candidate| candidate.exists())
}

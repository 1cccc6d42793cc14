// Staged middleware: predicate-filtered functions run before and after the handler

use crate::logging::{debug, trace};
use crate::{WebRequest, WebResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Point in the dispatch at which a middleware entry may apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStage {
    PreHandler,
    PostHandler,
}

impl RouteStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStage::PreHandler => "PRE_HANDLER",
            RouteStage::PostHandler => "POST_HANDLER",
        }
    }
}

impl fmt::Display for RouteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an entry applies to the request and response-so-far
pub type MiddlewarePredicate = Arc<dyn Fn(&WebRequest, &WebResponse) -> bool + Send + Sync>;

/// Mutates the request and response in place
pub type MiddlewareFn = Arc<dyn Fn(&mut WebRequest, &mut WebResponse) + Send + Sync>;

/// Predicate that applies to every request
pub fn always() -> impl Fn(&WebRequest, &WebResponse) -> bool + Send + Sync + 'static {
    |_, _| true
}

/// Predicate that never applies
pub fn never() -> impl Fn(&WebRequest, &WebResponse) -> bool + Send + Sync + 'static {
    |_, _| false
}

#[derive(Clone)]
pub struct MiddlewareEntry {
    stage: RouteStage,
    predicate: MiddlewarePredicate,
    apply: MiddlewareFn,
}

impl MiddlewareEntry {
    pub fn new<P, A>(stage: RouteStage, predicate: P, apply: A) -> Self
    where
        P: Fn(&WebRequest, &WebResponse) -> bool + Send + Sync + 'static,
        A: Fn(&mut WebRequest, &mut WebResponse) + Send + Sync + 'static,
    {
        Self {
            stage,
            predicate: Arc::new(predicate),
            apply: Arc::new(apply),
        }
    }

    pub fn stage(&self) -> RouteStage {
        self.stage
    }

    pub fn applies_to(&self, req: &WebRequest, resp: &WebResponse) -> bool {
        (self.predicate)(req, resp)
    }

    pub fn apply(&self, req: &mut WebRequest, resp: &mut WebResponse) {
        (self.apply)(req, resp)
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// Middleware entries grouped by stage.
///
/// Built once at configuration time and read-only afterwards. Entries that
/// are eligible at the same stage carry no ordering guarantee relative to
/// each other; callers must not depend on registration order.
#[derive(Clone, Default, Debug)]
pub struct MiddlewarePipeline {
    pre_handler: Vec<MiddlewareEntry>,
    post_handler: Vec<MiddlewareEntry>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, entry: MiddlewareEntry) {
        match entry.stage {
            RouteStage::PreHandler => self.pre_handler.push(entry),
            RouteStage::PostHandler => self.post_handler.push(entry),
        }
    }

    pub fn entries(&self, stage: RouteStage) -> &[MiddlewareEntry] {
        match stage {
            RouteStage::PreHandler => &self.pre_handler,
            RouteStage::PostHandler => &self.post_handler,
        }
    }

    pub fn len(&self) -> usize {
        self.pre_handler.len() + self.post_handler.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries at `stage` whose predicate holds for the current request state
    pub fn applicable(
        &self,
        stage: RouteStage,
        req: &WebRequest,
        resp: &WebResponse,
    ) -> Vec<&MiddlewareEntry> {
        self.entries(stage)
            .iter()
            .filter(|entry| entry.applies_to(req, resp))
            .collect()
    }

    /// Evaluate every predicate at `stage`, then apply the selected entries.
    ///
    /// Selection happens before any entry runs, so an entry cannot enable or
    /// disable a sibling at the same stage. Returns how many entries ran.
    pub fn run_stage(&self, stage: RouteStage, req: &mut WebRequest, resp: &mut WebResponse) -> usize {
        let selected = self.applicable(stage, req, resp);
        debug!(
            stage = %stage,
            registered = self.entries(stage).len(),
            applicable = selected.len(),
            "Running middleware stage"
        );

        for (index, entry) in selected.iter().enumerate() {
            trace!(stage = %stage, middleware_index = index, "Applying middleware");
            entry.apply(req, resp);
        }
        selected.len()
    }
}

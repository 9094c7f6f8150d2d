//! Suite/test registration tree
//!
//! Declarations are made through a [`RegistryBuilder`], the explicit
//! "current suite" context. `describe` pushes a new suite, runs its
//! declaration callback synchronously so nested calls attach to it, and pops
//! it again. Hooks and tests always attach to the suite on top of the stack,
//! which starts out as an implicit, unnamed root.
//!
//! [`RegistryBuilder::finish`] freezes the tree into a [`Registry`]. Nodes
//! live in two arenas indexed by [`SuiteId`] and [`TestId`]; parents are
//! plain ids, so the tree has no reference cycles.
//!
//! ```
//! use quicksuite::{expect, Registry};
//!
//! let registry = Registry::declare(|ctx| {
//!     ctx.describe("math", |ctx| {
//!         ctx.test("adds", || {
//!             expect(1 + 1).to_be_equal(2)?;
//!             Ok(())
//!         });
//!         ctx.test_skip("divides by zero");
//!     });
//! })
//! .unwrap();
//! assert_eq!(registry.test_count(), 2);
//! ```

mod callback;

pub use callback::{Callback, Outcome};

use crate::error::{messages, DeclarationKind, Error, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;

/// Separator between suite names in a qualified test name
pub const PATH_SEPARATOR: &str = " > ";

/// Index of a suite in a [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiteId(usize);

/// Index of a test in a [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestId(usize);

/// Whether a node takes part in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Normal,
    Skipped,
}

/// Declaration options for the three-argument forms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Register the node as skipped
    pub skip: bool,
}

impl Options {
    /// Options that mark the node as skipped
    pub fn skipped() -> Self {
        Self { skip: true }
    }

    fn mode(self) -> Mode {
        if self.skip {
            Mode::Skipped
        } else {
            Mode::Normal
        }
    }
}

/// The four lifecycle hook lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::BeforeAll => write!(f, "beforeAll"),
            HookKind::AfterAll => write!(f, "afterAll"),
            HookKind::BeforeEach => write!(f, "beforeEach"),
            HookKind::AfterEach => write!(f, "afterEach"),
        }
    }
}

/// Hooks registered on one suite, each list in registration order
#[derive(Debug, Default)]
pub struct Hooks {
    before_all: Vec<Callback>,
    after_all: Vec<Callback>,
    before_each: Vec<Callback>,
    after_each: Vec<Callback>,
}

impl Hooks {
    /// Hooks of one kind
    pub fn get(&self, kind: HookKind) -> &[Callback] {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::AfterAll => &self.after_all,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
        }
    }

    fn push(&mut self, kind: HookKind, hook: Callback) {
        match kind {
            HookKind::BeforeAll => self.before_all.push(hook),
            HookKind::AfterAll => self.after_all.push(hook),
            HookKind::BeforeEach => self.before_each.push(hook),
            HookKind::AfterEach => self.after_each.push(hook),
        }
    }
}

/// A child of a suite, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Suite(SuiteId),
    Test(TestId),
}

/// One `describe` block
#[derive(Debug)]
pub struct SuiteNode {
    pub name: String,
    pub mode: Mode,
    pub children: Vec<Node>,
    pub hooks: Hooks,
    /// Enclosing suite; `None` only for the root
    pub parent: Option<SuiteId>,
}

impl SuiteNode {
    fn new(name: String, mode: Mode, parent: Option<SuiteId>) -> Self {
        Self {
            name,
            mode,
            children: Vec::new(),
            hooks: Hooks::default(),
            parent,
        }
    }
}

/// One `test` declaration
#[derive(Debug)]
pub struct TestNode {
    pub name: String,
    pub mode: Mode,
    /// Never invoked at declaration time; absent for `test_skip`
    pub body: Option<Callback>,
    pub parent: SuiteId,
}

// ---------------------------------------------------------------------------
// Registry (frozen tree)
// ---------------------------------------------------------------------------

/// A frozen registration tree, ready to be executed
#[derive(Debug)]
pub struct Registry {
    suites: Vec<SuiteNode>,
    tests: Vec<TestNode>,
}

impl Registry {
    /// Id of the implicit root suite
    pub const ROOT: SuiteId = SuiteId(0);

    /// Run `declarations` against a fresh builder and freeze the result
    pub fn declare(declarations: impl FnOnce(&mut RegistryBuilder)) -> Result<Registry> {
        let mut builder = RegistryBuilder::new();
        declarations(&mut builder);
        builder.finish()
    }

    /// The implicit root suite
    pub fn root(&self) -> &SuiteNode {
        self.suite(Self::ROOT)
    }

    pub fn suite(&self, id: SuiteId) -> &SuiteNode {
        &self.suites[id.0]
    }

    pub fn test(&self, id: TestId) -> &TestNode {
        &self.tests[id.0]
    }

    /// Number of declared tests, skipped ones included
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Number of declared suites, excluding the root
    pub fn suite_count(&self) -> usize {
        self.suites.len() - 1
    }

    /// The chain from the root down to `id`, outermost first
    pub fn ancestry(&self, id: SuiteId) -> Vec<SuiteId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(sid) = current {
            chain.push(sid);
            current = self.suite(sid).parent;
        }
        chain.reverse();
        chain
    }

    /// Suite names from the outermost declared suite down to `id`, joined
    /// with [`PATH_SEPARATOR`]. Empty for the root.
    pub fn suite_path(&self, id: SuiteId) -> String {
        self.ancestry(id)
            .into_iter()
            .filter(|sid| *sid != Self::ROOT)
            .map(|sid| self.suite(sid).name.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// Fully-qualified test name: suite path plus test name
    pub fn qualified_name(&self, id: TestId) -> String {
        let test = self.test(id);
        let path = self.suite_path(test.parent);
        if path.is_empty() {
            test.name.clone()
        } else {
            format!("{}{}{}", path, PATH_SEPARATOR, test.name)
        }
    }

    /// Whether the test or any enclosing suite is skipped
    pub fn is_skipped(&self, id: TestId) -> bool {
        let test = self.test(id);
        test.mode == Mode::Skipped
            || self
                .ancestry(test.parent)
                .into_iter()
                .any(|sid| self.suite(sid).mode == Mode::Skipped)
    }

    /// All tests beneath `id`, depth-first in declaration order
    pub fn tests_under(&self, id: SuiteId) -> Vec<TestId> {
        let mut out = Vec::new();
        self.collect_tests(id, &mut out);
        out
    }

    /// All tests of the run, depth-first in declaration order
    pub fn test_ids(&self) -> Vec<TestId> {
        self.tests_under(Self::ROOT)
    }

    fn collect_tests(&self, id: SuiteId, out: &mut Vec<TestId>) {
        for child in &self.suite(id).children {
            match *child {
                Node::Test(tid) => out.push(tid),
                Node::Suite(sid) => self.collect_tests(sid, out),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryBuilder (declaration context)
// ---------------------------------------------------------------------------

/// Declaration context: owns the tree under construction and the stack of
/// open suites.
#[derive(Debug)]
pub struct RegistryBuilder {
    suites: Vec<SuiteNode>,
    tests: Vec<TestNode>,
    stack: Vec<SuiteId>,
    errors: Vec<Error>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Create a builder whose current suite is the implicit root
    pub fn new() -> Self {
        Self {
            suites: vec![SuiteNode::new(String::new(), Mode::Normal, None)],
            tests: Vec::new(),
            stack: vec![Registry::ROOT],
            errors: Vec::new(),
        }
    }

    fn current(&self) -> SuiteId {
        *self.stack.last().unwrap_or(&Registry::ROOT)
    }

    fn current_path(&self) -> String {
        self.stack
            .iter()
            .skip(1)
            .map(|sid| self.suites[sid.0].name.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    fn validate_name(&mut self, kind: DeclarationKind, name: &str) -> bool {
        if !name.trim().is_empty() {
            return true;
        }
        let err = Error::usage(kind, self.current_path(), messages::blank_name(name));
        tracing::warn!(error = %err, "rejected declaration");
        self.errors.push(err);
        false
    }

    fn open_suite(&mut self, name: String, mode: Mode) -> SuiteId {
        let parent = self.current();
        let id = SuiteId(self.suites.len());
        self.suites.push(SuiteNode::new(name, mode, Some(parent)));
        self.suites[parent.0].children.push(Node::Suite(id));
        id
    }

    fn register_suite<F>(&mut self, name: String, mode: Mode, body: F) -> &mut Self
    where
        F: FnOnce(&mut RegistryBuilder),
    {
        if !self.validate_name(DeclarationKind::Suite, &name) {
            return self;
        }
        let id = self.open_suite(name, mode);
        self.stack.push(id);
        body(self);
        self.stack.pop();
        self
    }

    fn register_test(&mut self, name: String, mode: Mode, body: Option<Callback>) -> &mut Self {
        if !self.validate_name(DeclarationKind::Test, &name) {
            return self;
        }
        let parent = self.current();
        let id = TestId(self.tests.len());
        self.tests.push(TestNode {
            name,
            mode,
            body,
            parent,
        });
        self.suites[parent.0].children.push(Node::Test(id));
        self
    }

    fn register_hook(&mut self, kind: HookKind, hook: Callback) -> &mut Self {
        let current = self.current();
        tracing::trace!(hook = %kind, suite = current.0, "registered hook");
        self.suites[current.0].hooks.push(kind, hook);
        self
    }

    /// Declare a suite; `body` runs immediately to declare its contents
    pub fn describe<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut RegistryBuilder),
    {
        self.register_suite(name.into(), Mode::Normal, body)
    }

    /// Declare a suite with options. A skipped suite still runs `body`, so
    /// its tests are visible and report as skipped.
    pub fn describe_with<F>(&mut self, name: impl Into<String>, options: Options, body: F) -> &mut Self
    where
        F: FnOnce(&mut RegistryBuilder),
    {
        self.register_suite(name.into(), options.mode(), body)
    }

    /// Declare an empty skipped suite
    pub fn describe_skip(&mut self, name: impl Into<String>) -> &mut Self {
        self.register_suite(name.into(), Mode::Skipped, |_| {})
    }

    /// Declare a test with a synchronous body
    pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_test(name.into(), Mode::Normal, Some(Callback::sync(body)))
    }

    /// Declare a test with a synchronous body and options
    pub fn test_with<F>(&mut self, name: impl Into<String>, options: Options, body: F) -> &mut Self
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_test(name.into(), options.mode(), Some(Callback::sync(body)))
    }

    /// Declare a test whose body returns a future
    pub fn test_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_test(name.into(), Mode::Normal, Some(Callback::from_async(body)))
    }

    /// Declare a test whose body returns a future, with options
    pub fn test_async_with<F, Fut>(
        &mut self,
        name: impl Into<String>,
        options: Options,
        body: F,
    ) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_test(name.into(), options.mode(), Some(Callback::from_async(body)))
    }

    /// Declare a skipped test without a body
    pub fn test_skip(&mut self, name: impl Into<String>) -> &mut Self {
        self.register_test(name.into(), Mode::Skipped, None)
    }

    pub fn before_all<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookKind::BeforeAll, Callback::sync(hook))
    }

    pub fn before_all_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_hook(HookKind::BeforeAll, Callback::from_async(hook))
    }

    pub fn after_all<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookKind::AfterAll, Callback::sync(hook))
    }

    pub fn after_all_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_hook(HookKind::AfterAll, Callback::from_async(hook))
    }

    pub fn before_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookKind::BeforeEach, Callback::sync(hook))
    }

    pub fn before_each_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_hook(HookKind::BeforeEach, Callback::from_async(hook))
    }

    pub fn after_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookKind::AfterEach, Callback::sync(hook))
    }

    pub fn after_each_async<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_hook(HookKind::AfterEach, Callback::from_async(hook))
    }

    /// Freeze the tree. Fails with the first usage error recorded during
    /// declaration.
    pub fn finish(mut self) -> Result<Registry> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }
        tracing::debug!(
            suites = self.suites.len() - 1,
            tests = self.tests.len(),
            "registration tree frozen"
        );
        Ok(Registry {
            suites: self.suites,
            tests: self.tests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> Outcome {
        Ok(())
    }

    #[test]
    fn test_nesting_and_declaration_order() {
        let registry = Registry::declare(|ctx| {
            ctx.describe("A", |ctx| {
                ctx.test("a1", ok);
                ctx.describe("B", |ctx| {
                    ctx.test("b1", ok);
                });
                ctx.test("a2", ok);
            });
            ctx.test("top", ok);
        })
        .unwrap();

        let names: Vec<String> = registry
            .test_ids()
            .into_iter()
            .map(|id| registry.qualified_name(id))
            .collect();
        assert_eq!(names, vec!["A > a1", "A > B > b1", "A > a2", "top"]);
        assert_eq!(registry.suite_count(), 2);
        assert_eq!(registry.root().children.len(), 2);
    }

    #[test]
    fn test_bodies_not_invoked_at_declaration() {
        let registry = Registry::declare(|ctx| {
            ctx.test("never", || panic!("body ran during declaration"));
        })
        .unwrap();
        assert_eq!(registry.test_count(), 1);
    }

    #[test]
    fn test_skip_forms() {
        let registry = Registry::declare(|ctx| {
            ctx.describe_skip("empty");
            ctx.describe_with("skipped", Options::skipped(), |ctx| {
                ctx.test("inherits", ok);
            });
            ctx.test_skip("pending");
            ctx.test_with("opted out", Options::skipped(), ok);
            ctx.test_with("plain options", Options::default(), ok);
        })
        .unwrap();

        let ids = registry.test_ids();
        assert_eq!(ids.len(), 4);
        assert!(registry.is_skipped(ids[0]));
        assert_eq!(registry.test(ids[0]).mode, Mode::Normal);
        assert!(registry.test(ids[1]).body.is_none());
        assert!(registry.is_skipped(ids[2]));
        assert!(!registry.is_skipped(ids[3]));
    }

    #[test]
    fn test_hooks_attach_to_current_suite() {
        let registry = Registry::declare(|ctx| {
            ctx.before_all(ok);
            ctx.describe("inner", |ctx| {
                ctx.before_each(ok).after_each(ok).after_each(ok);
                ctx.after_all_async(|| async { anyhow::Ok(()) });
            });
        })
        .unwrap();

        assert_eq!(registry.root().hooks.get(HookKind::BeforeAll).len(), 1);
        let inner = match registry.root().children[0] {
            Node::Suite(sid) => registry.suite(sid),
            Node::Test(_) => panic!("expected a suite"),
        };
        assert_eq!(inner.hooks.get(HookKind::AfterEach).len(), 2);
        assert!(inner.hooks.get(HookKind::AfterAll)[0].is_async());
        assert_eq!(inner.hooks.get(HookKind::BeforeEach).len(), 1);
        assert!(inner.hooks.get(HookKind::BeforeAll).is_empty());
    }

    #[test]
    fn test_blank_name_is_usage_error() {
        let err = Registry::declare(|ctx| {
            ctx.describe("outer", |ctx| {
                ctx.test("  ", ok);
            });
        })
        .unwrap_err();
        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "UsageError: test in 'outer': name must not be blank (got \"  \")"
        );
    }

    #[test]
    fn test_ancestry_is_outermost_first() {
        let registry = Registry::declare(|ctx| {
            ctx.describe("a", |ctx| {
                ctx.describe("b", |ctx| {
                    ctx.test("t", ok);
                });
            });
        })
        .unwrap();
        let tid = registry.test_ids()[0];
        let chain = registry.ancestry(registry.test(tid).parent);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0], Registry::ROOT);
        assert_eq!(registry.suite_path(chain[2]), "a > b");
    }
}

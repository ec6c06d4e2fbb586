//! [`Engine`] — template discovery, compilation and layout-aware rendering.
//!
//! # Locking
//!
//! | Lock        | Held by                                              |
//! |-------------|------------------------------------------------------|
//! | `funcs`     | `add_func`, `add_func_map`, the whole of `load`      |
//! | `state`     | brief reads/writes of the load flags                 |
//! | `templates` | brief pointer read (render) / swap (end of `load`)   |
//!
//! A render only clones the current template-set `Arc`, so renders run in
//! parallel with each other and with a reload in progress. A load is never
//! interleaved with function registration.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;
use tera::{Function, Tera, Value};

use stencil_source::{walk_files, FileSource, OsSource};

use crate::config::{check_extension, EngineConfig, DEFAULT_LAYOUT_KEY};
use crate::context::to_context;
use crate::error::{calls_function, chain_message, RenderError};
use crate::flash::{DrainGuard, Flashes};
use crate::funcs::{flash_func, hook_stub, FuncMap};

// ---------------------------------------------------------------------------
// Load state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LoadState {
    /// A load has completed successfully.
    loaded: bool,
    /// Recompile before every render.
    reload: bool,
}

impl LoadState {
    fn should_reload(self) -> bool {
        !self.loaded || self.reload
    }
}

/// Built-in function draining the flash store.
const FLASH_FUNC: &str = "flash";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Naming helpers
// ---------------------------------------------------------------------------

/// Whether the final path element ends in exactly `extension`
/// (the suffix from its last `.`).
fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.rfind('.').map(|i| &n[i..]))
        == Some(extension)
}

/// `<root>/a/b/c.html` → `a/b/c`, whatever the host separator.
fn template_name(root: &Path, path: &Path, extension: &str) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut name = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if name.ends_with(extension) {
        name.truncate(name.len() - extension.len());
    }
    name
}

fn contains(tera: &Tera, name: &str) -> bool {
    tera.get_template_names().any(|n| n == name)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compiles every template under a root into one Tera set and renders
/// templates from it, optionally inside a layout.
///
/// Two functions are always registered: the layout-hook name (default
/// `body`), which fails if called, and `flash`, which drains this engine's
/// [`Flashes`]. Both may be overwritten with [`Engine::add_func`].
pub struct Engine {
    root: PathBuf,
    extension: String,
    layout: String,
    source: Arc<dyn FileSource>,
    funcs: Mutex<FuncMap>,
    state: Mutex<LoadState>,
    templates: RwLock<Option<Arc<Tera>>>,
    flashes: Flashes,
}

impl Engine {
    /// Engine reading `*<extension>` files under `root` on the real file system.
    ///
    /// `extension` is checked at [`Engine::load`], which fails with
    /// [`RenderError::InvalidExtension`] unless it starts with `.`.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::build(root.into(), extension.into(), Arc::new(OsSource))
    }

    /// Engine reading from `source`, rooted at `/`. `extension` is checked as
    /// in [`Engine::new`].
    pub fn with_source(source: impl FileSource + 'static, extension: impl Into<String>) -> Self {
        Self::build(PathBuf::from("/"), extension.into(), Arc::new(source))
    }

    /// OS-backed engine from a validated [`EngineConfig`].
    pub fn from_config(cfg: &EngineConfig) -> Result<Self, RenderError> {
        cfg.validate()?;
        Ok(Self::new(cfg.root.clone(), cfg.extension.clone())
            .with_layout(&cfg.layout)?
            .with_reload(cfg.reload))
    }

    fn build(root: PathBuf, extension: String, source: Arc<dyn FileSource>) -> Self {
        let flashes = Flashes::new();
        let mut funcs = FuncMap::new();
        funcs.insert(DEFAULT_LAYOUT_KEY.to_string(), hook_stub(DEFAULT_LAYOUT_KEY));
        funcs.insert(FLASH_FUNC.to_string(), flash_func(flashes.clone()));
        Engine {
            root,
            extension,
            layout: DEFAULT_LAYOUT_KEY.to_string(),
            source,
            funcs: Mutex::new(funcs),
            state: Mutex::new(LoadState::default()),
            templates: RwLock::new(None),
            flashes,
        }
    }

    // Builder methods consume the engine before it is shared; the `&self`
    // methods below may be called at any time, from any thread.

    /// Renames the layout hook; layouts then embed the body with `{{ <key> }}`.
    ///
    /// Fails with [`RenderError::ReservedLayoutKey`] for `flash`, whose
    /// built-in function the hook stub would otherwise replace.
    pub fn with_layout(mut self, key: impl Into<String>) -> Result<Self, RenderError> {
        let key = key.into();
        if key == FLASH_FUNC {
            return Err(RenderError::ReservedLayoutKey(key));
        }
        let funcs = self.funcs.get_mut().unwrap_or_else(PoisonError::into_inner);
        funcs.remove(&self.layout);
        funcs.insert(key.clone(), hook_stub(&key));
        self.layout = key;
        Ok(self)
    }

    /// Builder form of [`Engine::set_reload`].
    pub fn with_reload(self, enabled: bool) -> Self {
        self.set_reload(enabled);
        self
    }

    /// When enabled, every render recompiles the whole template set first.
    /// Meant for development; edits show up without a restart. Can be
    /// toggled on a live, shared engine.
    pub fn set_reload(&self, enabled: bool) -> &Self {
        lock(&self.state).reload = enabled;
        self
    }

    /// Registers `f` under `name`, replacing any existing function.
    /// Takes effect at the next load.
    pub fn add_func(&self, name: impl Into<String>, f: impl Function + 'static) -> &Self {
        lock(&self.funcs).insert(name.into(), Arc::new(f));
        self
    }

    /// Registers every function in `map` at once; a concurrent load sees
    /// either none or all of them.
    pub fn add_func_map(&self, map: FuncMap) -> &Self {
        lock(&self.funcs).extend(map);
        self
    }

    pub fn flashes(&self) -> &Flashes {
        &self.flashes
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn layout_key(&self) -> &str {
        &self.layout
    }

    pub fn is_loaded(&self) -> bool {
        lock(&self.state).loaded
    }

    /// Names in the current template set, sorted. Empty before the first load.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .template_set()
            .map(|t| t.get_template_names().map(str::to_string).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.template_set().is_some_and(|t| contains(&t, name))
    }

    fn template_set(&self) -> Option<Arc<Tera>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Compiles every matching file under the root into a fresh template set.
    ///
    /// No-op once loaded unless a reload is pending. The new set replaces the
    /// current one only if the whole walk and compile succeed; on failure the
    /// previous set stays in place and the next call tries again.
    pub fn load(&self) -> Result<(), RenderError> {
        let funcs = lock(&self.funcs);
        if lock(&self.state).loaded {
            return Ok(());
        }

        let tera = self.compile(&funcs)?;
        let count = tera.get_template_names().count();
        *self.templates.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(tera));
        lock(&self.state).loaded = true;

        tracing::debug!(root = %self.root.display(), templates = count, "templates loaded");
        Ok(())
    }

    fn compile(&self, funcs: &FuncMap) -> Result<Tera, RenderError> {
        check_extension(&self.extension)?;
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        for (name, f) in funcs {
            let f = Arc::clone(f);
            tera.register_function(name, move |args: &HashMap<String, Value>| f.call(args));
        }

        let mut sources = Vec::new();
        for path in walk_files(self.source.as_ref(), &self.root)? {
            if !has_extension(&path, &self.extension) {
                continue;
            }
            let name = template_name(&self.root, &path, &self.extension);
            let bytes = self.source.read_all(&path)?;
            let text = String::from_utf8(bytes)
                .map_err(|source| RenderError::Encoding { path: path.clone(), source })?;
            tracing::trace!(name = %name, path = %path.display(), "compiling template");
            sources.push((name, text));
        }

        // One batch, so `extends`/`include` targets resolve regardless of walk order.
        tera.add_raw_templates(sources)
            .map_err(|source| RenderError::Compile { root: self.root.clone(), source })?;
        Ok(tera)
    }

    // -----------------------------------------------------------------------
    // Render
    // -----------------------------------------------------------------------

    /// Renders template `name` with `data` into `out`, inside `layout` if given.
    ///
    /// With a layout, the body is rendered first and bound to the layout-hook
    /// variable; if the body fails, that variable holds the error message and
    /// its causes instead, and the layout still renders. Since the body runs
    /// before the layout, it drains flash messages first: a layout calling
    /// `flash()` ahead of `{{ body }}` only sees what the body left.
    ///
    /// Lookup and data errors are returned before anything is written. The
    /// flash store is emptied when this returns, whatever the outcome.
    pub fn render<W, T>(
        &self,
        out: &mut W,
        name: &str,
        data: &T,
        layout: Option<&str>,
    ) -> Result<(), RenderError>
    where
        W: Write + ?Sized,
        T: Serialize + ?Sized,
    {
        let _drain = DrainGuard(&self.flashes);

        let state = *lock(&self.state);
        if state.should_reload() {
            if state.reload {
                lock(&self.state).loaded = false;
                tracing::debug!(root = %self.root.display(), "reloading templates");
            }
            self.load()?;
        }

        let tera = self
            .template_set()
            .filter(|t| contains(t, name))
            .ok_or_else(|| RenderError::TemplateNotFound(name.to_string()))?;
        let layout = layout.filter(|l| !l.is_empty());
        if let Some(layout) = layout {
            if !contains(&tera, layout) {
                return Err(RenderError::LayoutNotFound(layout.to_string()));
            }
        }
        let ctx = to_context(data)?;

        let Some(layout) = layout else {
            return tera
                .render_to(name, &ctx, out)
                .map_err(|e| self.execution_error(name, e));
        };

        let body = match tera.render(name, &ctx) {
            Ok(body) => body,
            Err(e) => {
                let err = self.execution_error(name, e);
                let msg = chain_message(&err);
                tracing::warn!(template = name, layout, error = %msg, "body failed, embedding error in layout");
                msg
            }
        };
        let mut layout_ctx = ctx;
        layout_ctx.insert(self.layout.as_str(), &body);
        tera.render_to(layout, &layout_ctx, out)
            .map_err(|e| self.execution_error(layout, e))
    }

    /// [`Engine::render`] into a `String`.
    pub fn render_to_string<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        layout: Option<&str>,
    ) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.render(&mut buf, name, data, layout)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn execution_error(&self, name: &str, source: tera::Error) -> RenderError {
        if calls_function(&source, &self.layout) {
            RenderError::UnexpectedHook {
                hook: self.layout.clone(),
                name: name.to_string(),
            }
        } else {
            RenderError::Execution {
                name: name.to_string(),
                source,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Render error boundary
//!
//! Wraps a view so that a failure while rendering under the active theme
//! produces a fallback view instead of tearing down the page. Both `Err`
//! returns and panics count as failures. After
//! [`DEFAULT_MAX_FAILURES`] consecutive failures under the same theme the
//! boundary forces the built-in default theme and tries once more.

use crate::config::EngineConfig;
use crate::descriptor::ThemeDescriptor;
use crate::error::RenderError;
use crate::store::ThemeStore;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// What the fallback view offers the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryAction {
    Retry,
    ResetToDefault,
}

/// Shown in place of a view that failed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackView {
    pub error: RenderError,
    /// Slug of the theme the view failed under
    pub theme_slug: String,
    /// Consecutive failures under that theme
    pub failures: u32,
    /// Whether the boundary already switched to the default theme
    pub auto_reset: bool,
}

impl FallbackView {
    pub fn actions(&self) -> [BoundaryAction; 2] {
        [BoundaryAction::Retry, BoundaryAction::ResetToDefault]
    }
}

/// Result of rendering through the boundary
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryOutcome<R> {
    Rendered(R),
    Fallback(FallbackView),
}

impl<R> BoundaryOutcome<R> {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    pub fn fallback(&self) -> Option<&FallbackView> {
        match self {
            Self::Fallback(view) => Some(view),
            Self::Rendered(_) => None,
        }
    }
}

/// Error boundary bound to a theme store
pub struct ErrorBoundary {
    store: Arc<ThemeStore>,
    max_failures: u32,
    failing_slug: Option<String>,
    failures: u32,
}

impl ErrorBoundary {
    pub fn new(store: Arc<ThemeStore>) -> Self {
        Self::with_max_failures(store, DEFAULT_MAX_FAILURES)
    }

    pub fn from_config(store: Arc<ThemeStore>, config: &EngineConfig) -> Self {
        Self::with_max_failures(store, config.boundary.max_consecutive_failures)
    }

    pub fn with_max_failures(store: Arc<ThemeStore>, max_failures: u32) -> Self {
        Self {
            store,
            max_failures: max_failures.max(1),
            failing_slug: None,
            failures: 0,
        }
    }

    /// Consecutive failures under the current failing theme
    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn active_theme(&self) -> Arc<ThemeDescriptor> {
        self.store
            .current_theme()
            .unwrap_or_else(|| self.store.default_theme())
    }

    /// Render `view` under the active theme
    pub fn render<R, V>(&mut self, mut view: V) -> BoundaryOutcome<R>
    where
        V: FnMut(&ThemeDescriptor) -> Result<R, RenderError>,
    {
        let theme = self.active_theme();
        let error = match run_view(&mut view, &theme) {
            Ok(rendered) => {
                self.failures = 0;
                self.failing_slug = None;
                return BoundaryOutcome::Rendered(rendered);
            }
            Err(error) => error,
        };

        if self.failing_slug.as_deref() != Some(theme.slug()) {
            self.failing_slug = Some(theme.slug().to_string());
            self.failures = 0;
        }
        self.failures += 1;
        tracing::error!(
            "ErrorBoundary: render failed under {:?} ({}/{}): {}",
            theme.slug(),
            self.failures,
            self.max_failures,
            error
        );

        if self.failures < self.max_failures {
            return BoundaryOutcome::Fallback(FallbackView {
                error,
                theme_slug: theme.slug().to_string(),
                failures: self.failures,
                auto_reset: false,
            });
        }

        tracing::warn!(
            "ErrorBoundary: {} consecutive failures under {:?}, forcing default theme",
            self.failures,
            theme.slug()
        );
        let failures = self.failures;
        self.reset_to_default();

        let default = self.store.default_theme();
        match run_view(&mut view, &default) {
            Ok(rendered) => BoundaryOutcome::Rendered(rendered),
            Err(error) => {
                tracing::error!("ErrorBoundary: render failed under default theme: {}", error);
                self.failing_slug = Some(default.slug().to_string());
                self.failures = 1;
                BoundaryOutcome::Fallback(FallbackView {
                    error,
                    theme_slug: theme.slug().to_string(),
                    failures,
                    auto_reset: true,
                })
            }
        }
    }

    /// Apply an action picked from a [`FallbackView`]
    pub fn handle<R, V>(&mut self, action: BoundaryAction, view: V) -> BoundaryOutcome<R>
    where
        V: FnMut(&ThemeDescriptor) -> Result<R, RenderError>,
    {
        if action == BoundaryAction::ResetToDefault {
            self.reset_to_default();
        }
        self.render(view)
    }

    /// Render again under the same theme
    pub fn retry<R, V>(&mut self, view: V) -> BoundaryOutcome<R>
    where
        V: FnMut(&ThemeDescriptor) -> Result<R, RenderError>,
    {
        self.handle(BoundaryAction::Retry, view)
    }

    /// Switch the store to the built-in default theme
    pub fn reset_to_default(&mut self) {
        let default = self.store.default_theme();
        tracing::info!("ErrorBoundary: resetting to {:?}", default.slug());
        if let Err(err) = self.store.set_theme(default) {
            tracing::error!("ErrorBoundary: default theme rejected: {}", err);
        }
        self.failures = 0;
        self.failing_slug = None;
    }
}

fn run_view<R, V>(view: &mut V, theme: &ThemeDescriptor) -> Result<R, RenderError>
where
    V: FnMut(&ThemeDescriptor) -> Result<R, RenderError>,
{
    match catch_unwind(AssertUnwindSafe(|| view(theme))) {
        Ok(result) => result,
        Err(payload) => Err(RenderError::from_panic(payload)),
    }
}

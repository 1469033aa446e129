//! Variable injection into a root style scope
//!
//! [`VariableInjector::apply`] derives the variable set for a theme and
//! queues it; the write happens on the next frame handed out by the
//! [`FrameScheduler`], as one batch with no reads in between. Applies that
//! arrive before the frame runs coalesce into the latest one. Variables from
//! the previous theme that the new one does not define are removed in the
//! same batch.

use crate::a11y::AccessibilityReport;
use crate::descriptor::ThemeDescriptor;
use crate::store::{ThemeStore, ThemeStoreState};
use crate::variables::{css_property, StyleVariableSet};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use vitrine_core::Subscription;

/// The style scope variables are written to
pub trait StyleTarget: Send {
    fn set_property(&mut self, name: &str, value: &str);

    fn remove_property(&mut self, name: &str);
}

/// Headless root scope that records what was written
#[derive(Debug, Default)]
pub struct RootStyle {
    properties: IndexMap<String, String>,
    writes: usize,
}

impl RootStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a custom property, e.g. `--color-primary`
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Total set/remove calls received
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl StyleTarget for RootStyle {
    fn set_property(&mut self, name: &str, value: &str) {
        self.writes += 1;
        self.properties.insert(name.to_string(), value.to_string());
    }

    fn remove_property(&mut self, name: &str) {
        self.writes += 1;
        self.properties.shift_remove(name);
    }
}

/// Source of render frames
pub trait FrameScheduler: Send + Sync {
    /// Run `callback` at the start of the next frame
    fn request_frame(&self, callback: Box<dyn FnOnce() + Send>);
}

/// Runs frame callbacks immediately, for headless use
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateFrames;

impl FrameScheduler for ImmediateFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce() + Send>) {
        callback();
    }
}

/// Queues frame callbacks until [`ManualFrames::run_frame`] is called
#[derive(Clone, Default)]
pub struct ManualFrames {
    queue: Arc<Mutex<Vec<Box<dyn FnOnce() + Send>>>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run every queued callback, returning how many ran
    pub fn run_frame(&self) -> usize {
        let callbacks = std::mem::take(&mut *self.queue.lock());
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: Box<dyn FnOnce() + Send>) {
        self.queue.lock().push(callback);
    }
}

#[derive(Default)]
struct InjectorState {
    /// Last theme handed to `apply`
    requested: Option<Arc<ThemeDescriptor>>,
    /// `None` means "remove everything"
    pending: Option<Option<StyleVariableSet>>,
    frame_requested: bool,
    applied: StyleVariableSet,
    batches: u64,
}

struct Shared<S> {
    target: Mutex<S>,
    state: Mutex<InjectorState>,
}

impl<S: StyleTarget> Shared<S> {
    /// Frame callback: write the pending set as one batch
    fn flush(&self) {
        let (next, stale, batch) = {
            let mut state = self.state.lock();
            state.frame_requested = false;
            let Some(pending) = state.pending.take() else {
                return;
            };
            let next = pending.unwrap_or_default();
            let stale: Vec<String> = state
                .applied
                .names()
                .filter(|name| !next.contains(name))
                .map(str::to_string)
                .collect();
            state.batches += 1;
            state.applied = next.clone();
            (next, stale, state.batches)
        };

        let mut target = self.target.lock();
        for name in &stale {
            target.remove_property(&css_property(name));
        }
        for (name, value) in next.iter() {
            target.set_property(&css_property(name), &value.to_css());
        }
        tracing::trace!(
            "VariableInjector: batch {} wrote {} variables, removed {}",
            batch,
            next.len(),
            stale.len()
        );
    }
}

/// Writes theme variables into a [`StyleTarget`] once per frame
pub struct VariableInjector<S, F> {
    shared: Arc<Shared<S>>,
    frames: Arc<F>,
}

impl<S, F> Clone for VariableInjector<S, F> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            frames: self.frames.clone(),
        }
    }
}

impl<S> VariableInjector<S, ImmediateFrames>
where
    S: StyleTarget + 'static,
{
    /// Injector that writes synchronously on every apply
    pub fn immediate(target: S) -> Self {
        Self::new(target, ImmediateFrames)
    }
}

impl<S, F> VariableInjector<S, F>
where
    S: StyleTarget + 'static,
    F: FrameScheduler + 'static,
{
    pub fn new(target: S, frames: F) -> Self {
        Self {
            shared: Arc::new(Shared {
                target: Mutex::new(target),
                state: Mutex::new(InjectorState::default()),
            }),
            frames: Arc::new(frames),
        }
    }

    /// Queue `theme` for the next frame
    ///
    /// Returns `false` when `theme` is already the requested theme; nothing
    /// is queued in that case.
    pub fn apply(&self, theme: &Arc<ThemeDescriptor>) -> bool {
        {
            let mut state = self.shared.state.lock();
            if let Some(requested) = &state.requested {
                if Arc::ptr_eq(requested, theme) || **requested == **theme {
                    return false;
                }
            }
            state.requested = Some(theme.clone());
        }

        let report = AccessibilityReport::for_theme(theme);
        if !report.is_compliant() {
            tracing::warn!("VariableInjector: {}", report.summary());
        }

        self.queue(Some(StyleVariableSet::from_descriptor(theme)));
        true
    }

    /// Queue `theme` even if it is already applied
    pub fn reapply(&self, theme: &Arc<ThemeDescriptor>) {
        self.shared.state.lock().requested = Some(theme.clone());
        self.queue(Some(StyleVariableSet::from_descriptor(theme)));
    }

    /// Queue removal of every variable this injector wrote
    pub fn reset(&self) {
        self.shared.state.lock().requested = None;
        self.queue(None);
    }

    fn queue(&self, set: Option<StyleVariableSet>) {
        let request_frame = {
            let mut state = self.shared.state.lock();
            state.pending = Some(set);
            !std::mem::replace(&mut state.frame_requested, true)
        };
        if request_frame {
            let shared = self.shared.clone();
            self.frames.request_frame(Box::new(move || shared.flush()));
        }
    }

    /// Keep the target in sync with `store`, starting with its current theme
    pub fn attach(&self, store: &ThemeStore) -> Subscription {
        let injector = self.clone();
        let listener = move |state: &ThemeStoreState| match &state.current_theme {
            Some(theme) => {
                injector.apply(theme);
            }
            None => injector.reset(),
        };
        listener(&store.snapshot());
        store.subscribe(listener)
    }

    /// Variables written by the last flushed batch
    pub fn applied(&self) -> StyleVariableSet {
        self.shared.state.lock().applied.clone()
    }

    /// Number of batches flushed so far
    pub fn batches(&self) -> u64 {
        self.shared.state.lock().batches
    }

    /// Inspect the target
    pub fn with_target<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        let target = self.shared.target.lock();
        read(&*target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ThemePreset;

    fn theme(preset: ThemePreset) -> Arc<ThemeDescriptor> {
        Arc::new(preset.descriptor())
    }

    #[test]
    fn immediate_apply_writes_all_variables() {
        let injector = VariableInjector::immediate(RootStyle::new());
        let warm = theme(ThemePreset::WarmComfort);
        assert!(injector.apply(&warm));

        let expected = StyleVariableSet::from_descriptor(&warm);
        injector.with_target(|root| {
            assert_eq!(root.len(), expected.len());
            assert_eq!(root.get("--font-size-base"), Some("17px"));
        });
        assert_eq!(injector.batches(), 1);
    }

    #[test]
    fn reapplying_the_same_theme_is_a_no_op() {
        let injector = VariableInjector::immediate(RootStyle::new());
        let warm = theme(ThemePreset::WarmComfort);
        injector.apply(&warm);
        let writes = injector.with_target(RootStyle::writes);

        assert!(!injector.apply(&warm));
        // Equal content behind a different Arc is also recognized
        assert!(!injector.apply(&theme(ThemePreset::WarmComfort)));
        assert_eq!(injector.with_target(RootStyle::writes), writes);
        assert_eq!(injector.batches(), 1);
    }

    #[test]
    fn applies_within_a_frame_coalesce() {
        let frames = ManualFrames::new();
        let injector = VariableInjector::new(RootStyle::new(), frames.clone());

        injector.apply(&theme(ThemePreset::WarmComfort));
        injector.apply(&theme(ThemePreset::PremiumDark));
        assert_eq!(frames.pending(), 1);
        assert!(injector.with_target(RootStyle::is_empty));

        assert_eq!(frames.run_frame(), 1);
        assert_eq!(injector.batches(), 1);
        let expected = StyleVariableSet::from_descriptor(&ThemePreset::PremiumDark.descriptor());
        injector.with_target(|root| {
            assert_eq!(
                root.get("--color-primary"),
                expected.get("color-primary").map(|v| v.to_css()).as_deref()
            );
        });
    }

    #[test]
    fn stale_variables_are_removed_in_the_same_batch() {
        let injector = VariableInjector::immediate(RootStyle::new());
        let mut custom = ThemePreset::Default.descriptor();
        custom.meta.slug = "custom".into();
        let custom = Arc::new(custom);
        injector.apply(&custom);
        injector.with_target(|root| assert!(root.get("--color-primary").is_some()));

        injector.reset();
        injector.with_target(|root| assert!(root.is_empty()));
        assert_eq!(injector.batches(), 2);
    }

    #[test]
    fn reapply_forces_a_batch() {
        let injector = VariableInjector::immediate(RootStyle::new());
        let warm = theme(ThemePreset::WarmComfort);
        injector.apply(&warm);
        injector.reapply(&warm);
        assert_eq!(injector.batches(), 2);
        assert_eq!(injector.applied(), StyleVariableSet::from_descriptor(&warm));
    }
}

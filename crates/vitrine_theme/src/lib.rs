//! Vitrine Theme Engine
//!
//! Loads storefront themes from a hosting service, keeps the active theme in
//! a subscribable store, and turns it into style variables.
//!
//! # Overview
//!
//! - **Descriptors**: [`ThemeDescriptor`] is the immutable theme document:
//!   palette, typography, header, footer and content blocks
//! - **Client**: [`ThemeClient`] performs one bounded request per fetch over a
//!   [`ThemeTransport`] (HTTP via [`ReqwestTransport`], or the built-in
//!   [`PresetTransport`])
//! - **Store**: [`ThemeStore`] resolves loads through memory, durable storage
//!   and the network, always settling to a usable theme
//! - **Variables**: [`VariableInjector`] writes the derived
//!   [`StyleVariableSet`] into a [`StyleTarget`] once per frame
//! - **Accessibility**: [`validate`] reports WCAG contrast for the theme's
//!   color pairs
//! - **Boundary**: [`ErrorBoundary`] turns render failures into a fallback
//!   view and forces the default theme after repeated failures
//!
//! # Quick Start
//!
//! ```rust
//! use vitrine_theme::{RootStyle, ThemeClient, ThemeStore, VariableInjector};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = ThemeStore::builder(ThemeClient::offline()).build();
//! let injector = VariableInjector::immediate(RootStyle::new());
//! let _sync = injector.attach(&store);
//!
//! store.load_theme("warm-comfort").await;
//! injector.with_target(|root| {
//!     assert_eq!(root.get("--font-size-base"), Some("17px"));
//! });
//! # });
//! ```

pub mod a11y;
pub mod boundary;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod injector;
pub mod presets;
pub mod store;
pub mod variables;

pub use a11y::{validate, AccessibilityReport, ColorRole, ContrastResult};
pub use boundary::{BoundaryAction, BoundaryOutcome, ErrorBoundary, FallbackView};
pub use client::{PresetTransport, ReqwestTransport, ThemeClient, ThemeTransport, TransportResponse};
pub use config::EngineConfig;
pub use descriptor::{
    ContentBlock, DarkPalette, FooterConfig, HeaderConfig, HeaderLayout, HeaderPosition, Link,
    Palette, PaletteRole, ThemeDescriptor, ThemeMeta, Typography,
};
pub use error::{ConfigError, DescriptorError, FetchError, FetchErrorKind, RenderError};
pub use injector::{FrameScheduler, ImmediateFrames, ManualFrames, RootStyle, StyleTarget, VariableInjector};
pub use presets::{preset_descriptor, ThemePreset};
pub use store::{ThemePhase, ThemeStore, ThemeStoreBuilder, ThemeStoreState};
pub use variables::{StyleValue, StyleVariableSet};

// Re-export the building blocks callers need to configure a store
pub use vitrine_cache::{FileStore, KeyValueStore, MemoryStore};
pub use vitrine_core::{Color, Subscription};

//! Vitrine Core
//!
//! Leaf primitives shared by the storefront theme engine:
//!
//! - **Colors**: hex parsing and normalization, HSL conversion
//! - **Contrast**: WCAG relative luminance, contrast ratio and level
//! - **Observers**: listener lists with drop-to-unsubscribe handles
//!
//! # Example
//!
//! ```rust
//! use vitrine_core::{contrast_ratio, Color, WcagLevel};
//!
//! let text = Color::from_hex_str("#111827").unwrap();
//! let background = Color::from_hex_str("#fff").unwrap();
//!
//! let ratio = contrast_ratio(text, background);
//! assert_eq!(WcagLevel::classify(ratio), WcagLevel::Aaa);
//! ```

pub mod color;
pub mod contrast;
pub mod hsl;
pub mod observer;

pub use color::{Color, ColorError};
pub use contrast::{
    contrast_ratio, readable_text_on, relative_luminance, WcagLevel, AAA_RATIO, AA_LARGE_RATIO,
    AA_RATIO,
};
pub use hsl::Hsl;
pub use observer::{Listener, Subscribers, Subscription};

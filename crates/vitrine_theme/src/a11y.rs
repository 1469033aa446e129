//! WCAG contrast checks over a theme's color pairs
//!
//! Results are informational: a failing theme is still applied, and callers
//! decide whether to surface the report.

use crate::descriptor::ThemeDescriptor;
use serde::Serialize;
use std::fmt;
use vitrine_core::{contrast_ratio, readable_text_on, Color, WcagLevel, AA_LARGE_RATIO, AA_RATIO, AAA_RATIO};

/// A color slot as rendered on the storefront
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorRole {
    Text,
    Background,
    Primary,
    OnPrimary,
    Secondary,
    OnSecondary,
    Accent,
    HeaderText,
    HeaderBackground,
    FooterText,
    FooterLink,
    FooterBackground,
}

impl ColorRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Background => "background",
            Self::Primary => "primary",
            Self::OnPrimary => "primary button text",
            Self::Secondary => "secondary",
            Self::OnSecondary => "secondary button text",
            Self::Accent => "accent",
            Self::HeaderText => "header text",
            Self::HeaderBackground => "header background",
            Self::FooterText => "footer text",
            Self::FooterLink => "footer link",
            Self::FooterBackground => "footer background",
        }
    }

    /// Concrete color of this role in `theme`
    pub fn resolve(self, theme: &ThemeDescriptor) -> Color {
        let palette = &theme.palette;
        match self {
            Self::Text => palette.text,
            Self::Background => palette.background,
            Self::Primary => palette.primary,
            Self::OnPrimary => readable_text_on(palette.primary),
            Self::Secondary => palette.secondary,
            Self::OnSecondary => readable_text_on(palette.secondary),
            Self::Accent => palette.accent,
            Self::HeaderText => theme.header_text(),
            Self::HeaderBackground => theme.header_background(),
            Self::FooterText => theme.footer_text(),
            Self::FooterLink => theme.footer_link(),
            Self::FooterBackground => theme.footer_background(),
        }
    }
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Foreground/background pairs checked for every theme
pub const CHECKED_PAIRS: [(ColorRole, ColorRole); 8] = [
    (ColorRole::Text, ColorRole::Background),
    (ColorRole::Primary, ColorRole::Background),
    (ColorRole::Accent, ColorRole::Background),
    (ColorRole::OnPrimary, ColorRole::Primary),
    (ColorRole::OnSecondary, ColorRole::Secondary),
    (ColorRole::HeaderText, ColorRole::HeaderBackground),
    (ColorRole::FooterText, ColorRole::FooterBackground),
    (ColorRole::FooterLink, ColorRole::FooterBackground),
];

/// Contrast of one foreground/background pair
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContrastResult {
    pub foreground: ColorRole,
    pub background: ColorRole,
    pub ratio: f64,
    /// Normal text, ratio >= 4.5
    pub aa: bool,
    /// Normal text, ratio >= 7.0
    pub aaa: bool,
    /// Large text, ratio >= 3.0
    pub aa_large: bool,
}

impl ContrastResult {
    pub fn level(&self) -> WcagLevel {
        WcagLevel::classify(self.ratio)
    }
}

/// Check one pair of concrete colors
pub fn check_pair(
    foreground: ColorRole,
    background: ColorRole,
    fg: Color,
    bg: Color,
) -> ContrastResult {
    let ratio = contrast_ratio(fg, bg);
    ContrastResult {
        foreground,
        background,
        ratio,
        aa: ratio >= AA_RATIO,
        aaa: ratio >= AAA_RATIO,
        aa_large: ratio >= AA_LARGE_RATIO,
    }
}

/// Check every pair in [`CHECKED_PAIRS`]
pub fn validate(theme: &ThemeDescriptor) -> Vec<ContrastResult> {
    CHECKED_PAIRS
        .iter()
        .map(|&(fg, bg)| check_pair(fg, bg, fg.resolve(theme), bg.resolve(theme)))
        .collect()
}

/// Contrast results for one theme
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccessibilityReport {
    pub slug: String,
    pub results: Vec<ContrastResult>,
}

impl AccessibilityReport {
    pub fn for_theme(theme: &ThemeDescriptor) -> Self {
        Self {
            slug: theme.slug().to_string(),
            results: validate(theme),
        }
    }

    /// Pairs below AA for normal text
    pub fn failures(&self) -> impl Iterator<Item = &ContrastResult> + '_ {
        self.results.iter().filter(|result| !result.aa)
    }

    pub fn is_compliant(&self) -> bool {
        self.failures().next().is_none()
    }

    /// One-line description, e.g. for a log line
    pub fn summary(&self) -> String {
        let failures: Vec<String> = self
            .failures()
            .map(|r| format!("{} on {} ({:.2}:1)", r.foreground, r.background, r.ratio))
            .collect();
        if failures.is_empty() {
            format!("theme {:?} passes WCAG AA on all {} pairs", self.slug, self.results.len())
        } else {
            format!(
                "theme {:?} fails WCAG AA on {} of {} pairs: {}",
                self.slug,
                failures.len(),
                self.results.len(),
                failures.join(", ")
            )
        }
    }
}

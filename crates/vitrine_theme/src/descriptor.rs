//! Theme descriptor model
//!
//! The descriptor is authored by the theme hosting service and treated as
//! immutable once retrieved. Its JSON shape uses camelCase keys:
//!
//! ```json
//! {
//!   "meta": { "name": "Warm Comfort", "slug": "warm-comfort" },
//!   "colors": { "primary": "#b45309", "secondary": "#78350f", "accent": "#c2410c",
//!               "background": "#fffbeb", "text": "#292524",
//!               "border": "#fde68a", "shadow": "#451a03" },
//!   "typography": { "fontFamily": "Lora, serif", "baseFontSize": 16,
//!                   "lineHeight": 1.6, "borderRadius": 12 },
//!   "header": { "layout": "centered", "position": "sticky", "navigationItems": [] },
//!   "footer": { "columns": 3, "sections": [] },
//!   "components": [ { "type": "hero", "config": { "title": "Welcome" } } ]
//! }
//! ```
//!
//! Every color must be present and parse as `#RGB` or `#RRGGBB`; colors are
//! normalized to lowercase `#rrggbb` on the way in.

use crate::error::DescriptorError;
use serde::{Deserialize, Serialize};
use vitrine_core::Color;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_SLUG_LEN: usize = 50;
pub const FONT_SIZE_RANGE: (u32, u32) = (10, 24);
pub const LINE_HEIGHT_RANGE: (f32, f32) = (1.0, 3.0);
pub const MAX_BORDER_RADIUS: u32 = 50;
pub const FOOTER_COLUMN_RANGE: (u8, u8) = (1, 6);

/// A complete storefront theme
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDescriptor {
    pub meta: ThemeMeta,
    #[serde(rename = "colors")]
    pub palette: Palette,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub footer: FooterConfig,
    /// Content blocks in render order
    #[serde(rename = "components", default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<DarkPalette>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeMeta {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The seven palette colors every theme carries
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub background: Color,
    pub text: Color,
    pub border: Color,
    pub shadow: Color,
}

/// Palette slot names, in variable emission order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaletteRole {
    Primary,
    Secondary,
    Accent,
    Background,
    Text,
    Border,
    Shadow,
}

impl PaletteRole {
    pub const ALL: [PaletteRole; 7] = [
        PaletteRole::Primary,
        PaletteRole::Secondary,
        PaletteRole::Accent,
        PaletteRole::Background,
        PaletteRole::Text,
        PaletteRole::Border,
        PaletteRole::Shadow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Accent => "accent",
            Self::Background => "background",
            Self::Text => "text",
            Self::Border => "border",
            Self::Shadow => "shadow",
        }
    }
}

impl Palette {
    pub fn get(&self, role: PaletteRole) -> Color {
        match role {
            PaletteRole::Primary => self.primary,
            PaletteRole::Secondary => self.secondary,
            PaletteRole::Accent => self.accent,
            PaletteRole::Background => self.background,
            PaletteRole::Text => self.text,
            PaletteRole::Border => self.border,
            PaletteRole::Shadow => self.shadow,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PaletteRole, Color)> + '_ {
        PaletteRole::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

/// Optional dark-scheme overrides
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DarkPalette {
    pub primary: Color,
    pub secondary: Color,
    pub background: Color,
    pub text: Color,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    /// Base font size in px
    pub base_font_size: u32,
    pub line_height: f32,
    /// Corner radius in px
    pub border_radius: u32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "Inter, system-ui, sans-serif".to_string(),
            base_font_size: 16,
            line_height: 1.5,
            border_radius: 8,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderLayout {
    #[default]
    Classic,
    Centered,
    Split,
    Minimal,
}

impl HeaderLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Centered => "centered",
            Self::Split => "split",
            Self::Minimal => "minimal",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPosition {
    #[default]
    Static,
    Sticky,
    Fixed,
}

impl HeaderPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Sticky => "sticky",
            Self::Fixed => "fixed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    #[serde(alias = "url")]
    pub href: String,
}

impl Link {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderConfig {
    #[serde(default)]
    pub layout: HeaderLayout,
    #[serde(default)]
    pub position: HeaderPosition,
    #[serde(default = "default_header_height")]
    pub height: u32,
    /// Navigation entries in display order
    #[serde(default)]
    pub navigation_items: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Color>,
}

fn default_header_height() -> u32 {
    64
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            layout: HeaderLayout::default(),
            position: HeaderPosition::default(),
            height: default_header_height(),
            navigation_items: Vec::new(),
            background_color: None,
            text_color: None,
        }
    }
}

impl HeaderConfig {
    pub fn is_sticky(&self) -> bool {
        matches!(self.position, HeaderPosition::Sticky | HeaderPosition::Fixed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterSection {
    pub title: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterConfig {
    #[serde(default = "default_footer_columns")]
    pub columns: u8,
    #[serde(default)]
    pub sections: Vec<FooterSection>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    #[serde(default)]
    pub legal_links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_text: Option<String>,
}

fn default_footer_columns() -> u8 {
    3
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            columns: default_footer_columns(),
            sections: Vec::new(),
            social_links: Vec::new(),
            legal_links: Vec::new(),
            background_color: None,
            text_color: None,
            link_color: None,
            copyright_text: None,
        }
    }
}

/// A typed content block with a free-form payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(rename = "config", default)]
    pub payload: serde_json::Value,
}

fn enabled_by_default() -> bool {
    true
}

impl ContentBlock {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            enabled: true,
            payload,
        }
    }
}

impl ThemeDescriptor {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn slug(&self) -> &str {
        &self.meta.slug
    }

    /// Parse and validate a JSON descriptor
    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self = serde_json::from_str(json)
            .map_err(|e| DescriptorError::new("$", e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn to_json_pretty(&self) -> String {
        // Serialization of plain data with string keys cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Enabled blocks in render order
    pub fn enabled_blocks(&self) -> impl Iterator<Item = &ContentBlock> + '_ {
        self.blocks.iter().filter(|block| block.enabled)
    }

    pub fn header_background(&self) -> Color {
        self.header.background_color.unwrap_or(self.palette.background)
    }

    pub fn header_text(&self) -> Color {
        self.header.text_color.unwrap_or(self.palette.text)
    }

    pub fn footer_background(&self) -> Color {
        self.footer.background_color.unwrap_or(self.palette.text)
    }

    pub fn footer_text(&self) -> Color {
        self.footer.text_color.unwrap_or(self.palette.background)
    }

    pub fn footer_link(&self) -> Color {
        self.footer.link_color.unwrap_or(self.footer_text())
    }

    /// First validation failure, if any
    pub fn validate(&self) -> Result<(), DescriptorError> {
        match self.issues().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every validation failure
    ///
    /// Colors are already well-formed by construction; this covers identity,
    /// typography ranges, footer layout and block tags.
    pub fn issues(&self) -> Vec<DescriptorError> {
        let mut issues = Vec::new();

        let name = self.meta.name.trim();
        if name.is_empty() {
            issues.push(DescriptorError::new("meta.name", "must not be empty"));
        } else if name.chars().count() > MAX_NAME_LEN {
            issues.push(DescriptorError::new(
                "meta.name",
                format!("must be at most {MAX_NAME_LEN} characters"),
            ));
        }

        if let Err(message) = check_slug(&self.meta.slug) {
            issues.push(DescriptorError::new("meta.slug", message));
        }

        let typography = &self.typography;
        if typography.font_family.trim().is_empty() {
            issues.push(DescriptorError::new("typography.fontFamily", "must not be empty"));
        }
        let (min_size, max_size) = FONT_SIZE_RANGE;
        if !(min_size..=max_size).contains(&typography.base_font_size) {
            issues.push(DescriptorError::new(
                "typography.baseFontSize",
                format!("must be between {min_size} and {max_size}"),
            ));
        }
        let (min_lh, max_lh) = LINE_HEIGHT_RANGE;
        if !(min_lh..=max_lh).contains(&typography.line_height) {
            issues.push(DescriptorError::new(
                "typography.lineHeight",
                format!("must be between {min_lh:.1} and {max_lh:.1}"),
            ));
        }
        if typography.border_radius > MAX_BORDER_RADIUS {
            issues.push(DescriptorError::new(
                "typography.borderRadius",
                format!("must be at most {MAX_BORDER_RADIUS}"),
            ));
        }

        let (min_cols, max_cols) = FOOTER_COLUMN_RANGE;
        if !(min_cols..=max_cols).contains(&self.footer.columns) {
            issues.push(DescriptorError::new(
                "footer.columns",
                format!("must be between {min_cols} and {max_cols}"),
            ));
        }

        for (i, block) in self.blocks.iter().enumerate() {
            if block.kind.trim().is_empty() {
                issues.push(DescriptorError::new(
                    format!("components[{i}].type"),
                    "must not be empty",
                ));
            }
        }

        issues
    }
}

fn check_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(format!("must be 1 to {MAX_SLUG_LEN} characters"));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err("may only contain lowercase letters, digits and hyphens".to_string());
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("must not start or end with a hyphen".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ThemePreset;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r##"{
        "meta": { "name": "Test", "slug": "test" },
        "colors": {
            "primary": "#1D4ED8", "secondary": "#334", "accent": "#0e7490",
            "background": "#ffffff", "text": "#111827",
            "border": "#e5e7eb", "shadow": "#000000"
        }
    }"##;

    #[test]
    fn minimal_payload_gets_defaults() {
        let theme = ThemeDescriptor::from_json(MINIMAL).unwrap();
        assert_eq!(theme.slug(), "test");
        assert_eq!(theme.palette.primary.to_hex(), "#1d4ed8");
        assert_eq!(theme.palette.secondary.to_hex(), "#333344");
        assert_eq!(theme.typography, Typography::default());
        assert_eq!(theme.header.height, 64);
        assert_eq!(theme.footer.columns, 3);
        assert!(theme.blocks.is_empty());
        assert!(theme.dark_mode.is_none());
    }

    #[test]
    fn missing_palette_key_is_rejected() {
        let json = MINIMAL.replace(r##""shadow": "#000000""##, r##""shade": "#000000""##);
        let err = ThemeDescriptor::from_json(&json).unwrap_err();
        assert!(err.message.contains("shadow"), "{err}");
    }

    #[test]
    fn malformed_hex_is_rejected() {
        let json = MINIMAL.replace("#ffffff", "#fffff");
        assert!(ThemeDescriptor::from_json(&json).is_err());
        let json = MINIMAL.replace("#ffffff", "white");
        assert!(ThemeDescriptor::from_json(&json).is_err());
    }

    #[test]
    fn block_order_is_preserved() {
        let json = MINIMAL.replacen(
            "\"colors\"",
            r#""components": [
                {"type": "hero", "config": {"title": "Hi"}},
                {"type": "menu", "enabled": false},
                {"type": "gallery"}
            ],
            "colors""#,
            1,
        );
        let theme = ThemeDescriptor::from_json(&json).unwrap();
        let kinds: Vec<_> = theme.blocks.iter().map(|b| b.kind.as_str()).collect();
        assert_eq!(kinds, ["hero", "menu", "gallery"]);
        let enabled: Vec<_> = theme.enabled_blocks().map(|b| b.kind.as_str()).collect();
        assert_eq!(enabled, ["hero", "gallery"]);
        assert_eq!(theme.blocks[0].payload["title"], "Hi");
    }

    #[test]
    fn header_and_footer_fall_back_to_palette() {
        let theme = ThemeDescriptor::from_json(MINIMAL).unwrap();
        assert_eq!(theme.header_background(), theme.palette.background);
        assert_eq!(theme.header_text(), theme.palette.text);
        assert_eq!(theme.footer_background(), theme.palette.text);
        assert_eq!(theme.footer_link(), theme.footer_text());
    }

    #[test]
    fn slug_rules() {
        assert!(check_slug("warm-comfort").is_ok());
        assert!(check_slug("v2").is_ok());
        assert!(check_slug("").is_err());
        assert!(check_slug("Warm").is_err());
        assert!(check_slug("-warm").is_err());
        assert!(check_slug("warm-").is_err());
        assert!(check_slug("warm comfort").is_err());
        assert!(check_slug(&"a".repeat(51)).is_err());
    }

    #[test]
    fn range_issues_are_collected() {
        let mut theme = ThemePreset::Default.descriptor();
        theme.typography.base_font_size = 30;
        theme.typography.line_height = 0.5;
        theme.footer.columns = 0;
        let blank = theme.blocks.len();
        theme.blocks.push(ContentBlock::new(" ", serde_json::Value::Null));

        let fields: Vec<String> = theme.issues().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "typography.baseFontSize".to_string(),
                "typography.lineHeight".to_string(),
                "footer.columns".to_string(),
                format!("components[{blank}].type"),
            ]
        );
        assert_eq!(theme.validate().unwrap_err().field, "typography.baseFontSize");
    }

    #[test]
    fn json_round_trip_keeps_wire_names() {
        let theme = ThemePreset::WarmComfort.descriptor();
        let json = theme.to_json_pretty();
        assert!(json.contains("\"colors\""));
        assert!(json.contains("\"baseFontSize\""));
        assert!(json.contains("\"navigationItems\""));
        assert_eq!(ThemeDescriptor::from_json(&json).unwrap(), theme);
    }
}

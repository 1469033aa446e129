//! Built-in storefront theme presets.
//!
//! [`ThemePreset::Default`] doubles as the hard-coded fallback theme: it is
//! always available, always valid and passes AA on every checked pair.

use crate::descriptor::{
    ContentBlock, DarkPalette, FooterConfig, FooterSection, HeaderConfig, HeaderLayout,
    HeaderPosition, Link, Palette, SocialLink, ThemeDescriptor, ThemeMeta, Typography,
};
use serde_json::json;
use std::fmt::{Display, Formatter};
use vitrine_core::Color;

/// Built-in theme preset catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    /// Neutral blue theme, used as the fallback.
    Default,
    /// Amber tones and a serif face for cafés and bakeries.
    WarmComfort,
    /// Gold on near-black for fine dining.
    PremiumDark,
    /// Sea blues and teals.
    CoastalBreeze,
}

impl ThemePreset {
    /// Stable preset id, also the theme slug.
    pub fn id(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::WarmComfort => "warm-comfort",
            Self::PremiumDark => "premium-dark",
            Self::CoastalBreeze => "coastal-breeze",
        }
    }

    /// User-facing display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::WarmComfort => "Warm Comfort",
            Self::PremiumDark => "Premium Dark",
            Self::CoastalBreeze => "Coastal Breeze",
        }
    }

    /// Full preset list.
    pub fn all() -> &'static [ThemePreset] {
        const PRESETS: [ThemePreset; 4] = [
            ThemePreset::Default,
            ThemePreset::WarmComfort,
            ThemePreset::PremiumDark,
            ThemePreset::CoastalBreeze,
        ];
        &PRESETS
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|preset| preset.id() == id)
    }

    /// Build the full descriptor for this preset.
    pub fn descriptor(self) -> ThemeDescriptor {
        match self {
            Self::Default => default_theme(),
            Self::WarmComfort => warm_comfort(),
            Self::PremiumDark => premium_dark(),
            Self::CoastalBreeze => coastal_breeze(),
        }
    }
}

impl Display for ThemePreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Convenience free function for ergonomic imports.
pub fn preset_descriptor(id: &str) -> Option<ThemeDescriptor> {
    ThemePreset::from_id(id).map(ThemePreset::descriptor)
}

impl ThemeDescriptor {
    /// The hard-coded theme used when nothing better is available
    pub fn fallback() -> Self {
        ThemePreset::Default.descriptor()
    }
}

#[derive(Clone, Copy)]
struct BasePalette {
    primary: u32,
    secondary: u32,
    accent: u32,
    background: u32,
    text: u32,
    border: u32,
    shadow: u32,
}

impl BasePalette {
    fn build(self) -> Palette {
        Palette {
            primary: Color::from_hex(self.primary),
            secondary: Color::from_hex(self.secondary),
            accent: Color::from_hex(self.accent),
            background: Color::from_hex(self.background),
            text: Color::from_hex(self.text),
            border: Color::from_hex(self.border),
            shadow: Color::from_hex(self.shadow),
        }
    }
}

#[derive(Clone, Copy)]
struct FooterColors {
    background: u32,
    text: u32,
    link: u32,
}

fn meta(preset: ThemePreset, description: &str) -> ThemeMeta {
    ThemeMeta {
        name: preset.display_name().to_string(),
        slug: preset.id().to_string(),
        version: Some("1.0.0".to_string()),
        description: Some(description.to_string()),
    }
}

fn navigation() -> Vec<Link> {
    vec![
        Link::new("Home", "/"),
        Link::new("Menu", "/menu"),
        Link::new("About", "/about"),
        Link::new("Contact", "/contact"),
    ]
}

fn footer(columns: u8, colors: FooterColors, copyright: &str) -> FooterConfig {
    FooterConfig {
        columns,
        sections: vec![
            FooterSection {
                title: "Visit".to_string(),
                links: vec![Link::new("Location", "/contact#map"), Link::new("Hours", "/about#hours")],
            },
            FooterSection {
                title: "Order".to_string(),
                links: vec![Link::new("Menu", "/menu"), Link::new("Delivery", "/delivery")],
            },
        ],
        social_links: vec![
            SocialLink {
                platform: "instagram".to_string(),
                url: "https://instagram.com".to_string(),
            },
            SocialLink {
                platform: "facebook".to_string(),
                url: "https://facebook.com".to_string(),
            },
        ],
        legal_links: vec![Link::new("Privacy", "/privacy"), Link::new("Terms", "/terms")],
        background_color: Some(Color::from_hex(colors.background)),
        text_color: Some(Color::from_hex(colors.text)),
        link_color: Some(Color::from_hex(colors.link)),
        copyright_text: Some(copyright.to_string()),
    }
}

fn storefront_blocks(hero_title: &str) -> Vec<ContentBlock> {
    vec![
        ContentBlock::new("hero", json!({ "title": hero_title, "cta": "View menu" })),
        ContentBlock::new("featured-products", json!({ "limit": 6 })),
        ContentBlock::new("testimonials", json!({ "limit": 3 })),
        ContentBlock::new("newsletter", json!({})),
    ]
}

fn default_theme() -> ThemeDescriptor {
    ThemeDescriptor {
        meta: meta(ThemePreset::Default, "Clean, neutral storefront theme"),
        palette: BasePalette {
            primary: 0x1d4ed8,
            secondary: 0x334155,
            accent: 0x0e7490,
            background: 0xffffff,
            text: 0x111827,
            border: 0xe5e7eb,
            shadow: 0x000000,
        }
        .build(),
        typography: Typography::default(),
        header: HeaderConfig {
            layout: HeaderLayout::Classic,
            position: HeaderPosition::Sticky,
            navigation_items: navigation(),
            ..HeaderConfig::default()
        },
        footer: footer(
            3,
            FooterColors {
                background: 0x111827,
                text: 0xf9fafb,
                link: 0x93c5fd,
            },
            "All rights reserved.",
        ),
        blocks: storefront_blocks("Welcome"),
        dark_mode: None,
    }
}

fn warm_comfort() -> ThemeDescriptor {
    ThemeDescriptor {
        meta: meta(ThemePreset::WarmComfort, "Amber tones for cafés and bakeries"),
        palette: BasePalette {
            primary: 0xb45309,
            secondary: 0x78350f,
            accent: 0xc2410c,
            background: 0xfffbeb,
            text: 0x292524,
            border: 0xfde68a,
            shadow: 0x451a03,
        }
        .build(),
        typography: Typography {
            font_family: "Lora, Georgia, serif".to_string(),
            base_font_size: 17,
            line_height: 1.6,
            border_radius: 12,
        },
        header: HeaderConfig {
            layout: HeaderLayout::Centered,
            position: HeaderPosition::Static,
            height: 72,
            navigation_items: navigation(),
            ..HeaderConfig::default()
        },
        footer: footer(
            3,
            FooterColors {
                background: 0x292524,
                text: 0xfef3c7,
                link: 0xfcd34d,
            },
            "Baked fresh daily.",
        ),
        blocks: storefront_blocks("Fresh from the oven"),
        dark_mode: None,
    }
}

fn premium_dark() -> ThemeDescriptor {
    ThemeDescriptor {
        meta: meta(ThemePreset::PremiumDark, "Gold accents on near-black for fine dining"),
        palette: BasePalette {
            primary: 0xd4af37,
            secondary: 0xa1a1aa,
            accent: 0xf59e0b,
            background: 0x0b0b0f,
            text: 0xf5f5f4,
            border: 0x27272a,
            shadow: 0x000000,
        }
        .build(),
        typography: Typography {
            font_family: "Playfair Display, serif".to_string(),
            base_font_size: 16,
            line_height: 1.7,
            border_radius: 2,
        },
        header: HeaderConfig {
            layout: HeaderLayout::Split,
            position: HeaderPosition::Fixed,
            height: 80,
            navigation_items: navigation(),
            ..HeaderConfig::default()
        },
        footer: footer(
            4,
            FooterColors {
                background: 0x000000,
                text: 0xe7e5e4,
                link: 0xd4af37,
            },
            "Reservations recommended.",
        ),
        blocks: storefront_blocks("An evening to remember"),
        // Already dark; the "dark" slots keep the same look.
        dark_mode: Some(DarkPalette {
            primary: Color::from_hex(0xd4af37),
            secondary: Color::from_hex(0xa1a1aa),
            background: Color::from_hex(0x0b0b0f),
            text: Color::from_hex(0xf5f5f4),
        }),
    }
}

fn coastal_breeze() -> ThemeDescriptor {
    ThemeDescriptor {
        meta: meta(ThemePreset::CoastalBreeze, "Sea blues and teals"),
        palette: BasePalette {
            primary: 0x0369a1,
            secondary: 0x0f766e,
            accent: 0x0e7490,
            background: 0xf0f9ff,
            text: 0x0c4a6e,
            border: 0xbae6fd,
            shadow: 0x082f49,
        }
        .build(),
        typography: Typography {
            font_family: "Nunito, system-ui, sans-serif".to_string(),
            base_font_size: 16,
            line_height: 1.5,
            border_radius: 16,
        },
        header: HeaderConfig {
            layout: HeaderLayout::Minimal,
            position: HeaderPosition::Sticky,
            height: 60,
            navigation_items: navigation(),
            ..HeaderConfig::default()
        },
        footer: footer(
            2,
            FooterColors {
                background: 0x0c4a6e,
                text: 0xf0f9ff,
                link: 0x7dd3fc,
            },
            "See you by the sea.",
        ),
        blocks: storefront_blocks("Catch of the day"),
        dark_mode: Some(DarkPalette {
            primary: Color::from_hex(0x38bdf8),
            secondary: Color::from_hex(0x2dd4bf),
            background: Color::from_hex(0x082f49),
            text: Color::from_hex(0xe0f2fe),
        }),
    }
}

// [[AGENTFLOOR]]/apps/floor-server/src/roles.rs
// Purpose: Role styling registry. Resolves role strings to display config, creating unseen roles lazily.
// Architecture: Cosmetic Layer
// Dependencies: DashMap, sha2

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::models::RoleConfig;

/// Roles seeded on startup.
const DEFAULT_ROLES: &[(&str, &str, &str)] = &[
    ("customer", "Customer", "#9CA3AF"),
    ("ba", "Business Analyst", "#3B82F6"),
    ("pm", "Project Manager", "#8B5CF6"),
    ("architect", "Architect", "#F97316"),
    ("developer", "Developer", "#22C55E"),
    ("qa", "QA Engineer", "#EF4444"),
];

/// Palette handed to custom roles in the order they first appear.
const CUSTOM_ROLE_COLORS: &[&str] = &[
    "#EC4899", // Pink
    "#06B6D4", // Cyan
    "#84CC16", // Lime
    "#F59E0B", // Amber
    "#6366F1", // Indigo
    "#14B8A6", // Teal
    "#F43F5E", // Rose
    "#0EA5E9", // Sky
];

pub struct RoleRegistry {
    configs: DashMap<String, RoleConfig>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        let registry = RoleRegistry {
            configs: DashMap::new(),
        };
        for (role_id, display_name, color) in DEFAULT_ROLES {
            registry.configs.insert(
                role_id.to_string(),
                RoleConfig {
                    role_id: role_id.to_string(),
                    display_name: display_name.to_string(),
                    color: color.to_string(),
                    zone_color: zone_tint(color),
                    is_default: true,
                },
            );
        }
        registry
    }

    /// Resolve a role to its styling config, creating one on first sight.
    pub fn resolve(&self, role: &str) -> RoleConfig {
        if let Some(config) = self.configs.get(role) {
            return config.clone();
        }

        let color = self.next_custom_color(role);
        let config = RoleConfig {
            role_id: role.to_string(),
            display_name: display_name(role),
            color: color.clone(),
            zone_color: zone_tint(&color),
            is_default: false,
        };
        tracing::info!("Registering role config: [{}] {}", role, config.display_name);

        // entry() so two concurrent first sights of a role agree on one config
        self.configs
            .entry(role.to_string())
            .or_insert(config)
            .clone()
    }

    /// Palette by first-seen order, then a deterministic hash-derived color
    /// once the palette runs out.
    fn next_custom_color(&self, role: &str) -> String {
        let custom_count = self.configs.iter().filter(|c| !c.is_default).count();
        match CUSTOM_ROLE_COLORS.get(custom_count) {
            Some(color) => color.to_string(),
            None => hashed_color(role),
        }
    }

    /// Snapshot of every known config, for the persistence layer.
    pub fn export(&self) -> Vec<RoleConfig> {
        self.configs.iter().map(|c| c.value().clone()).collect()
    }

    /// Restores configs from a persisted snapshot without clobbering
    /// anything registered since boot.
    pub fn hydrate(&self, configs: Vec<RoleConfig>) {
        for config in configs {
            self.configs.entry(config.role_id.clone()).or_insert(config);
        }
    }
}

/// "security_engineer" -> "Security Engineer"
fn display_name(role: &str) -> String {
    role.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic fallback color for roles beyond the palette. Derived from
/// a SHA-256 of the role string so every restart lands on the same color.
fn hashed_color(role: &str) -> String {
    let digest = Sha256::digest(role.as_bytes());
    let hue = u16::from_be_bytes([digest[0], digest[1]]) % 360;
    hsl_to_hex(f64::from(hue), 0.65, 0.55)
}

fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let byte = |v: f64| ((v + m) * 255.0).round() as u8;
    format!("#{:02X}{:02X}{:02X}", byte(r1), byte(g1), byte(b1))
}

/// "#22C55E" -> "rgba(34, 197, 94, 0.3)" for the floor-zone tint.
fn zone_tint(color: &str) -> String {
    let hex = color.trim_start_matches('#');
    if hex.len() == 6 && hex.is_ascii() {
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        format!("rgba({}, {}, {}, 0.3)", channel(0), channel(2), channel(4))
    } else {
        "rgba(156, 163, 175, 0.3)".to_string()
    }
}

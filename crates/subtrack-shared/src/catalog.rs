//! Static catalog of well-known services, used for autocomplete.

use serde::Serialize;

use crate::types::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub price: f64,
    pub frequency: Frequency,
}

const fn monthly(name: &'static str, price: f64) -> CatalogEntry {
    CatalogEntry {
        name,
        price,
        frequency: Frequency::Monthly,
    }
}

const fn yearly(name: &'static str, price: f64) -> CatalogEntry {
    CatalogEntry {
        name,
        price,
        frequency: Frequency::Yearly,
    }
}

pub static SERVICE_CATALOG: &[CatalogEntry] = &[
    // Streaming video
    monthly("Netflix (Standard)", 15.49),
    monthly("Netflix (Premium)", 22.99),
    monthly("Hulu (No Ads)", 17.99),
    monthly("Disney+ (No Ads)", 13.99),
    monthly("HBO Max", 15.99),
    yearly("Amazon Prime", 139.00),
    monthly("YouTube Premium", 13.99),
    monthly("Apple TV+", 9.99),
    monthly("Peacock Premium", 11.99),
    monthly("Paramount+", 11.99),
    // Music
    monthly("Spotify Premium", 11.99),
    monthly("Apple Music", 10.99),
    monthly("Amazon Music Unlimited", 9.99),
    monthly("Tidal", 10.99),
    // Productivity / software
    monthly("Adobe Creative Cloud", 59.99),
    yearly("Microsoft 365 Personal", 69.99),
    monthly("Dropbox Plus", 11.99),
    monthly("Evernote Personal", 14.99),
    monthly("Notion Plus", 10.00),
    monthly("ChatGPT Plus", 20.00),
    monthly("GitHub Copilot", 10.00),
    monthly("Midjourney", 30.00),
    // Gaming
    monthly("Xbox Game Pass Ultimate", 16.99),
    monthly("PlayStation Plus Premium", 17.99),
    yearly("Nintendo Switch Online", 19.99),
    // Other
    monthly("Amazon Prime (Monthly)", 14.99),
    monthly("Walmart+", 12.95),
    monthly("Instacart+", 9.99),
    monthly("Uber One", 9.99),
    monthly("DoorDash DashPass", 9.99),
];

/// Catalog entries whose name contains `query`, ignoring case.
pub fn suggest(query: &str) -> Vec<&'static CatalogEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    SERVICE_CATALOG
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&query))
        .collect()
}

/// Exact (case-insensitive) catalog lookup.
pub fn find(name: &str) -> Option<&'static CatalogEntry> {
    let name = name.trim().to_lowercase();
    SERVICE_CATALOG
        .iter()
        .find(|entry| entry.name.to_lowercase() == name)
}

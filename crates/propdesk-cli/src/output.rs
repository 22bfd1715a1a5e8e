//! Plain-text rendering of API results

use propdesk_core::{AdminUser, Listing, Page};
use std::fmt::Write;

/// Cut `text` to at most `width` characters, marking the cut with `...`
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// One line per listing plus a paging footer
pub fn listing_table(page: &Page<Listing>) -> String {
    let mut out = String::new();

    if page.data.is_empty() {
        out.push_str("No listings match these filters.\n");
    } else {
        let _ = writeln!(
            out,
            "{:<36}  {:<11}  {:<32}  {:<22}  {:>16}",
            "ID", "STATUS", "TITLE", "LOCATION", "PRICE"
        );
        for listing in &page.data {
            let _ = writeln!(
                out,
                "{:<36}  {:<11}  {:<32}  {:<22}  {:>16}",
                listing.id.to_string(),
                listing.status.as_str(),
                truncate(&listing.title, 32),
                truncate(&listing.address.summary(), 22),
                listing.formatted_price()
            );
        }
    }

    let _ = writeln!(
        out,
        "Page {} of {} ({} listings)",
        page.meta.page,
        page.meta.total_pages(),
        page.meta.total
    );
    out
}

/// Full details of one listing
pub fn listing_details(listing: &Listing) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", listing.title);
    let _ = writeln!(out, "  id:        {}", listing.id);
    let _ = writeln!(out, "  status:    {}", listing.status.label());
    if let Some(reason) = &listing.rejection_reason {
        let _ = writeln!(out, "  rejected:  {reason}");
    }
    let _ = writeln!(
        out,
        "  type:      {} / {}",
        listing.property_type, listing.listing_type
    );
    let _ = writeln!(out, "  price:     {}", listing.formatted_price());
    let _ = writeln!(out, "  location:  {}", listing.address.summary());

    let rooms: Vec<String> = [
        listing.bedrooms.map(|b| format!("{b} bed")),
        listing.bathrooms.map(|b| format!("{b} bath")),
        listing.area_sqm.map(|a| format!("{a} m2")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !rooms.is_empty() {
        let _ = writeln!(out, "  size:      {}", rooms.join(", "));
    }

    let _ = writeln!(
        out,
        "  owner:     {} <{}>",
        listing.owner.name, listing.owner.email
    );
    let _ = writeln!(
        out,
        "  updated:   {}",
        listing.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let actions: Vec<&str> = listing
        .status
        .allowed_actions()
        .iter()
        .map(|a| a.label())
        .collect();
    let _ = writeln!(out, "  actions:   {}", actions.join(", "));

    if !listing.description.trim().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", listing.description.trim());
    }
    out
}

/// Time left on a one-time code, e.g. `4m 05s`
pub fn countdown(seconds: i64) -> String {
    if seconds <= 0 {
        return "expired".to_string();
    }
    match (seconds / 60, seconds % 60) {
        (0, secs) => format!("{secs}s"),
        (mins, secs) => format!("{mins}m {secs:02}s"),
    }
}

/// `Name <email> (role)`
pub fn user_line(user: &AdminUser) -> String {
    format!("{} <{}> ({})", user.display_name(), user.email, user.role)
}

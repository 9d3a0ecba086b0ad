//! Derives ad copy (resource names, keywords, headlines, descriptions) from
//! listing snapshots and user interests.
//!
//! Everything produced here has to satisfy the ads platform's hard limits:
//! headline and description character bounds, keyword count caps, unique
//! resource names, and no control characters anywhere. Violating candidates
//! are truncated or replaced, never emitted as-is.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::models::ListingSnapshot;

/// Maximum characters per slug segment in a generated resource name.
pub const SLUG_SEGMENT_MAX_CHARS: usize = 20;

/// Maximum characters of a generated resource name.
pub const RESOURCE_NAME_MAX_CHARS: usize = 128;

/// Maximum keywords attached to one ad group.
pub const KEYWORD_LIMIT: usize = 20;

/// Maximum characters per keyword text.
pub const KEYWORD_MAX_CHARS: usize = 80;

pub const HEADLINE_MIN_CHARS: usize = 15;
pub const HEADLINE_MAX_CHARS: usize = 30;
pub const MIN_HEADLINES: usize = 3;
pub const MAX_HEADLINES: usize = 15;

pub const DESCRIPTION_MIN_CHARS: usize = 30;
pub const DESCRIPTION_MAX_CHARS: usize = 90;
pub const MIN_DESCRIPTIONS: usize = 2;
pub const MAX_DESCRIPTIONS: usize = 4;

/// Generic headlines used to backfill when a listing yields too few valid
/// candidates. All of these sit inside the platform's 15-30 char bounds.
const FALLBACK_HEADLINES: [&str; 5] = [
    "Find Your Dream Home Today",
    "Premium Property Listings",
    "Your Next Home Awaits Here",
    "Top Real Estate Deals Now",
    "Book A Viewing This Week",
];

/// Generic descriptions used to backfill; each sits inside the 30-90 bounds.
const FALLBACK_DESCRIPTIONS: [&str; 3] = [
    "Browse verified listings with transparent pricing and expert local support.",
    "Talk to our agents today and find a home that fits your budget and lifestyle.",
    "New properties listed every week. Arrange a private viewing at your convenience.",
];

/// Boilerplate appended to descriptions that come out too short.
const DESCRIPTION_PAD: &str = " Contact our team today to arrange a viewing.";

/// Generic fallback keywords always considered for an ad group.
const FALLBACK_KEYWORDS: [&str; 4] = [
    "homes for sale",
    "property for sale",
    "real estate listings",
    "buy property",
];

/// The complete creative bundle for one listing's ad group.
#[derive(Debug, Clone)]
pub struct CreativeSet {
    /// Listing this creative was derived from (used for the ad's final URL).
    pub listing_id: Uuid,
    /// Unique ad-group name, slugged and timestamp-suffixed.
    pub resource_name: String,
    pub keywords: Vec<String>,
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
}

/// Builds the creative bundle for one listing.
///
/// `timestamp` is a unix timestamp shared by all creatives of one pipeline
/// run; it makes resource names unique across runs so the platform does not
/// reject duplicates within the account.
pub fn build_creative(
    listing: &ListingSnapshot,
    interests: &[String],
    campaign_id: Uuid,
    timestamp: i64,
) -> CreativeSet {
    CreativeSet {
        listing_id: listing.id,
        resource_name: resource_name(listing, campaign_id, timestamp),
        keywords: keywords(listing, interests),
        headlines: headlines(listing),
        descriptions: descriptions(listing),
    }
}

/// Strips characters the platform hard-rejects (null bytes) and flattens
/// line breaks into spaces. Not cosmetic: these cause whole-operation
/// rejections.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\0')
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Lowercases, collapses non-alphanumeric runs to single hyphens, strips
/// leading/trailing hyphens, and caps the length.
pub fn slug(text: &str, max_chars: usize) -> String {
    // Compiled once; slugging runs repeatedly per pipeline run.
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new("[^a-z0-9]+").unwrap());
    let lowered = text.to_lowercase();
    let collapsed = non_alnum.replace_all(&lowered, "-");
    collapsed
        .trim_matches('-')
        .chars()
        .take(max_chars)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// Unique ad-group resource name:
/// `slug(title)-slug(location|type)-campaignId-timestamp`.
pub fn resource_name(listing: &ListingSnapshot, campaign_id: Uuid, timestamp: i64) -> String {
    let title_part = {
        let s = slug(&listing.title, SLUG_SEGMENT_MAX_CHARS);
        if s.is_empty() {
            "listing".to_string()
        } else {
            s
        }
    };

    // Secondary segment: prefer the location, fall back to the property type.
    let secondary_source = listing
        .location
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .or(listing.property_type.as_deref())
        .unwrap_or("property");
    let secondary_part = {
        let s = slug(secondary_source, SLUG_SEGMENT_MAX_CHARS);
        if s.is_empty() {
            "property".to_string()
        } else {
            s
        }
    };

    let name = format!(
        "{}-{}-{}-{}",
        title_part,
        secondary_part,
        campaign_id.simple(),
        timestamp
    );
    name.chars().take(RESOURCE_NAME_MAX_CHARS).collect()
}

/// Builds the keyword set for one listing: interest variants, listing-derived
/// phrases, then generic fallbacks, deduplicated case-insensitively and
/// capped at [`KEYWORD_LIMIT`].
pub fn keywords(listing: &ListingSnapshot, interests: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let mut push = |candidate: String| {
        let cleaned: String = sanitize(&candidate)
            .trim()
            .chars()
            .take(KEYWORD_MAX_CHARS)
            .collect::<String>()
            .trim_end()
            .to_string();
        if cleaned.is_empty() || out.len() >= KEYWORD_LIMIT {
            return;
        }
        if seen.insert(cleaned.to_lowercase()) {
            out.push(cleaned);
        }
    };

    for interest in interests {
        let interest = interest.trim();
        if interest.is_empty() {
            continue;
        }
        push(interest.to_string());
        push(format!("{} property", interest));
        push(format!("{} real estate", interest));
    }

    if let Some(location) = listing.location.as_deref().filter(|l| !l.trim().is_empty()) {
        push(format!("{} real estate", location.trim()));
        push(format!("{} houses", location.trim()));
    }
    if let Some(property_type) = listing
        .property_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        push(format!("{} for sale", property_type.trim().to_lowercase()));
        if let Some(bedrooms) = listing.bedrooms.filter(|b| *b > 0) {
            push(format!(
                "{} bedroom {}",
                bedrooms,
                property_type.trim().to_lowercase()
            ));
        }
    }

    for fallback in FALLBACK_KEYWORDS {
        push(fallback.to_string());
    }

    out
}

/// Builds 3-15 headlines, each 15-30 characters. Listing-derived candidates
/// outside the bounds are truncated (too long) or dropped in favour of a
/// fallback (too short).
pub fn headlines(listing: &ListingSnapshot) -> Vec<String> {
    let mut candidates = Vec::new();

    let location = listing.location.as_deref().map(str::trim).unwrap_or("");
    let property_type = listing
        .property_type
        .as_deref()
        .map(str::trim)
        .unwrap_or("");

    if !property_type.is_empty() && !location.is_empty() {
        candidates.push(format!("{} in {}", title_case(property_type), location));
    }
    if let Some(bedrooms) = listing.bedrooms.filter(|b| *b > 0) {
        if !property_type.is_empty() {
            candidates.push(format!(
                "{} Bedroom {} For Sale",
                bedrooms,
                title_case(property_type)
            ));
        }
    }
    if let Some(price) = listing.price.filter(|p| *p > 0.0) {
        candidates.push(format!("Priced From {}", format_price(price)));
    }
    if !location.is_empty() {
        candidates.push(format!("New Homes In {}", location));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        if out.len() >= MAX_HEADLINES {
            break;
        }
        if let Some(fitted) = fit(&candidate, HEADLINE_MIN_CHARS, HEADLINE_MAX_CHARS) {
            if seen.insert(fitted.to_lowercase()) {
                out.push(fitted);
            }
        }
    }

    // Backfill with generic headlines until the platform minimum is met.
    for fallback in FALLBACK_HEADLINES {
        if out.len() >= MIN_HEADLINES {
            break;
        }
        if seen.insert(fallback.to_lowercase()) {
            out.push(fallback.to_string());
        }
    }

    out
}

/// Builds 2-4 descriptions, each 30-90 characters. Short candidates get
/// boilerplate appended; long ones are truncated to the upper bound.
pub fn descriptions(listing: &ListingSnapshot) -> Vec<String> {
    let mut candidates = Vec::new();

    let location = listing.location.as_deref().map(str::trim).unwrap_or("");
    let property_type = listing
        .property_type
        .as_deref()
        .map(str::trim)
        .unwrap_or("");

    if !property_type.is_empty() {
        let mut sentence = title_case(property_type);
        if let Some(bedrooms) = listing.bedrooms.filter(|b| *b > 0) {
            sentence.push_str(&format!(" with {} bedrooms", bedrooms));
        }
        if let Some(area) = listing.area_sqm.filter(|a| *a > 0.0) {
            sentence.push_str(&format!(" and {:.0} sqm", area));
        }
        if !location.is_empty() {
            sentence.push_str(&format!(" in {}", location));
        }
        sentence.push_str(". Book a viewing today.");
        candidates.push(sentence);
    }
    if !location.is_empty() {
        candidates.push(format!(
            "Located in {}. Contact us now to arrange a private viewing.",
            location
        ));
    }
    if let Some(description) = listing.description.as_deref().filter(|d| !d.trim().is_empty()) {
        candidates.push(description.trim().to_string());
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        if out.len() >= MAX_DESCRIPTIONS {
            break;
        }
        if let Some(fitted) = fit_description(&candidate) {
            if seen.insert(fitted.to_lowercase()) {
                out.push(fitted);
            }
        }
    }

    for fallback in FALLBACK_DESCRIPTIONS {
        if out.len() >= MIN_DESCRIPTIONS {
            break;
        }
        if seen.insert(fallback.to_lowercase()) {
            out.push(fallback.to_string());
        }
    }

    out
}

/// Sanitizes and trims a candidate, truncating to `max_chars`. Returns
/// `None` when the result lands under `min_chars`; the caller substitutes a
/// fallback instead.
fn fit(candidate: &str, min_chars: usize, max_chars: usize) -> Option<String> {
    let cleaned = sanitize(candidate);
    let trimmed = cleaned.trim();
    let capped: String = trimmed.chars().take(max_chars).collect();
    let capped = capped.trim_end().to_string();
    if capped.chars().count() < min_chars {
        None
    } else {
        Some(capped)
    }
}

/// Description fitting: pads short candidates with boilerplate before
/// falling back, then applies the same truncate-and-check as [`fit`].
fn fit_description(candidate: &str) -> Option<String> {
    let cleaned = sanitize(candidate);
    let mut padded = cleaned.trim().to_string();
    if padded.is_empty() {
        return None;
    }
    while padded.chars().count() < DESCRIPTION_MIN_CHARS {
        padded.push_str(DESCRIPTION_PAD);
    }
    fit(&padded, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS)
}

/// Compact price label for headlines: "$450K", "$1.2M", "$950".
fn format_price(price: f64) -> String {
    if price >= 1_000_000.0 {
        format!("${:.1}M", price / 1_000_000.0)
    } else if price >= 1_000.0 {
        format!("${:.0}K", price / 1_000.0)
    } else {
        format!("${:.0}", price)
    }
}

/// Uppercases the first letter of each word ("town house" -> "Town House").
fn title_case(text: &str) -> String {
    text.split_whitespace()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ListingSnapshot {
        ListingSnapshot {
            id: Uuid::new_v4(),
            title: "Lakeside Apartment with Pool".to_string(),
            description: Some(
                "Bright two-level apartment overlooking the lake, minutes from the CBD."
                    .to_string(),
            ),
            location: Some("Nairobi".to_string()),
            price: Some(450_000.0),
            property_type: Some("apartment".to_string()),
            bedrooms: Some(3),
            bathrooms: Some(2),
            area_sqm: Some(120.0),
        }
    }

    #[test]
    fn slug_collapses_and_trims() {
        assert_eq!(slug("Lakeside  Apartment!!", 40), "lakeside-apartment");
        assert_eq!(slug("  --Hello, World--  ", 40), "hello-world");
        assert_eq!(slug("ABC", 2), "ab");
        assert_eq!(slug("!!!", 40), "");
    }

    #[test]
    fn resource_name_is_bounded_and_clean() {
        let listing = snapshot();
        let campaign_id = Uuid::new_v4();
        let name = resource_name(&listing, campaign_id, 1_700_000_000);

        assert!(name.chars().count() <= RESOURCE_NAME_MAX_CHARS);
        assert!(!name.contains('\0'));
        assert!(!name.contains('\n'));
        assert!(name.starts_with("lakeside-apartment-w-nairobi-"));
        assert!(name.ends_with("-1700000000"));
        assert!(name.contains(&campaign_id.simple().to_string()));
    }

    #[test]
    fn resource_name_survives_hostile_title() {
        let mut listing = snapshot();
        listing.title = "\0\n!!!".to_string();
        listing.location = Some("".to_string());
        listing.property_type = None;
        let name = resource_name(&listing, Uuid::new_v4(), 42);
        assert!(name.starts_with("listing-property-"));
    }

    #[test]
    fn keywords_union_dedup_and_cap() {
        let listing = snapshot();
        let interests = vec!["waterfront".to_string(), "Waterfront".to_string()];
        let kws = keywords(&listing, &interests);

        assert!(kws.len() <= KEYWORD_LIMIT);
        assert!(kws.contains(&"waterfront".to_string()));
        assert!(kws.contains(&"waterfront property".to_string()));
        assert!(kws.contains(&"Nairobi real estate".to_string()));
        assert!(kws.contains(&"apartment for sale".to_string()));
        assert!(kws.contains(&"3 bedroom apartment".to_string()));
        assert!(kws.contains(&"homes for sale".to_string()));
        // Case-insensitive dedup: the capitalized duplicate interest is gone.
        let lowered: Vec<String> = kws.iter().map(|k| k.to_lowercase()).collect();
        assert_eq!(
            lowered.len(),
            lowered.iter().collect::<std::collections::HashSet<_>>().len()
        );
    }

    #[test]
    fn keywords_cap_holds_with_many_interests() {
        let listing = snapshot();
        let interests: Vec<String> = (0..30).map(|i| format!("interest{}", i)).collect();
        let kws = keywords(&listing, &interests);
        assert_eq!(kws.len(), KEYWORD_LIMIT);
    }

    #[test]
    fn keywords_fall_back_for_bare_listing() {
        let listing = ListingSnapshot {
            id: Uuid::new_v4(),
            title: "Untitled".to_string(),
            description: None,
            location: None,
            price: None,
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            area_sqm: None,
        };
        let kws = keywords(&listing, &[]);
        assert!(!kws.is_empty());
        assert!(kws.contains(&"homes for sale".to_string()));
    }

    #[test]
    fn headlines_respect_bounds() {
        let listing = snapshot();
        let hs = headlines(&listing);
        assert!(hs.len() >= MIN_HEADLINES && hs.len() <= MAX_HEADLINES);
        for h in &hs {
            let chars = h.chars().count();
            assert!(
                (HEADLINE_MIN_CHARS..=HEADLINE_MAX_CHARS).contains(&chars),
                "headline out of bounds ({} chars): {:?}",
                chars,
                h
            );
            assert!(!h.contains('\0') && !h.contains('\n'));
        }
    }

    #[test]
    fn headlines_backfill_for_bare_listing() {
        let listing = ListingSnapshot {
            id: Uuid::new_v4(),
            title: "x".to_string(),
            description: None,
            location: None,
            price: None,
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            area_sqm: None,
        };
        let hs = headlines(&listing);
        assert_eq!(hs.len(), MIN_HEADLINES);
        for h in &hs {
            assert!(FALLBACK_HEADLINES.contains(&h.as_str()));
        }
    }

    #[test]
    fn overlong_headline_truncated_not_emitted() {
        let mut listing = snapshot();
        listing.location = Some("Dar es Salaam Masaki Peninsula Waterfront".to_string());
        let hs = headlines(&listing);
        for h in &hs {
            assert!(h.chars().count() <= HEADLINE_MAX_CHARS);
        }
    }

    #[test]
    fn descriptions_respect_bounds() {
        let listing = snapshot();
        let ds = descriptions(&listing);
        assert!(ds.len() >= MIN_DESCRIPTIONS && ds.len() <= MAX_DESCRIPTIONS);
        for d in &ds {
            let chars = d.chars().count();
            assert!(
                (DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&chars),
                "description out of bounds ({} chars): {:?}",
                chars,
                d
            );
        }
    }

    #[test]
    fn short_description_padded_with_boilerplate() {
        let mut listing = snapshot();
        listing.description = Some("Cozy flat.".to_string());
        listing.property_type = None;
        listing.location = None;
        let ds = descriptions(&listing);
        let padded = ds
            .iter()
            .find(|d| d.starts_with("Cozy flat."))
            .expect("short candidate should be padded, not dropped");
        assert!(padded.chars().count() >= DESCRIPTION_MIN_CHARS);
    }

    #[test]
    fn control_characters_stripped_everywhere() {
        let mut listing = snapshot();
        listing.title = "Bad\0Title\nHere".to_string();
        listing.description = Some("Line one\nline two\0 with more text to pass bounds.".to_string());
        listing.location = Some("Nai\0robi".to_string());

        let creative = build_creative(&listing, &["lake\nview".to_string()], Uuid::new_v4(), 7);
        let mut all_text = vec![creative.resource_name.clone()];
        all_text.extend(creative.keywords.clone());
        all_text.extend(creative.headlines.clone());
        all_text.extend(creative.descriptions.clone());
        for text in all_text {
            assert!(!text.contains('\0'), "null byte leaked: {:?}", text);
            assert!(!text.contains('\n'), "line feed leaked: {:?}", text);
        }
    }

    #[test]
    fn price_label_formats() {
        assert_eq!(format_price(450_000.0), "$450K");
        assert_eq!(format_price(1_200_000.0), "$1.2M");
        assert_eq!(format_price(950.0), "$950");
    }
}

use askama::Template;

use crate::error::AppError;
use crate::models::listing::Listing;

const PROJECT_URL: &str = "https://www.freelancermap.de/projekt";
const EXCERPT_CHARS: usize = 500;

#[derive(Template)]
#[template(path = "digest.html")]
struct DigestTemplate<'a> {
    fetcher: &'a str,
    items: Vec<DigestItem<'a>>,
}

struct DigestItem<'a> {
    id: i64,
    title: &'a str,
    created: String,
    company: &'a str,
    city: &'a str,
    link: String,
    excerpt: String,
}

impl<'a> From<&'a Listing> for DigestItem<'a> {
    fn from(listing: &'a Listing) -> Self {
        Self {
            id: listing.id,
            title: &listing.title,
            created: listing.created_display(),
            company: &listing.company,
            city: &listing.city,
            link: format!("{PROJECT_URL}/{}", listing.slug),
            excerpt: excerpt(&listing.description),
        }
    }
}

pub fn subject(fetcher: &str, count: usize) -> String {
    format!("Freelancermap ({fetcher}): {count} new project(s) found")
}

pub fn render(fetcher: &str, listings: &[Listing]) -> Result<String, AppError> {
    let tmpl = DigestTemplate {
        fetcher,
        items: listings.iter().map(DigestItem::from).collect(),
    };
    Ok(tmpl.render()?)
}

/// First `EXCERPT_CHARS` characters, with "..." appended when cut.
fn excerpt(description: &str) -> String {
    match description.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}

use crate::models::listing::Listing;

/// Newest `updated` timestamp seen for one search. `None` until the first
/// successful poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark(Option<i64>);

impl Watermark {
    pub fn at(timestamp: i64) -> Self {
        Self(Some(timestamp))
    }

    pub fn most_recent_seen(&self) -> Option<i64> {
        self.0
    }
}

/// Result of comparing one poll against the previous watermark.
#[derive(Debug, Default, PartialEq)]
pub struct Delta {
    pub new_listings: Vec<Listing>,
    pub watermark: Watermark,
}

/// Split a newest-first poll result into the listings not seen before and
/// the watermark to store for the next poll.
///
/// Without a watermark nothing is reported: the newest timestamp becomes the
/// baseline. With one, new listings are the leading run with `updated`
/// strictly above it. An empty result never clears the watermark.
pub fn compute_delta(listings: Vec<Listing>, watermark: Watermark) -> Delta {
    let Some(seen) = watermark.most_recent_seen() else {
        return Delta {
            new_listings: Vec::new(),
            watermark: Watermark(listings.first().map(|l| l.updated)),
        };
    };

    let new_listings: Vec<Listing> = listings
        .into_iter()
        .take_while(|l| l.updated > seen)
        .collect();

    let watermark = match new_listings.first() {
        Some(newest) => Watermark::at(newest.updated),
        None => watermark,
    };

    Delta {
        new_listings,
        watermark,
    }
}

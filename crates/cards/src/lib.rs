mod card;
mod config;
mod error;
mod feed;
mod image_url;
mod normalize;
mod source;

pub use card::{Card, CardPos, Grammar, UNTITLED_CARD};
pub use config::{SourceConfig, ANON_KEY_VARS, DEFAULT_TABLE, URL_VARS};
pub use error::{ConfigError, SourceError, FALLBACK_FETCH_MESSAGE};
pub use feed::{CardFeed, CardsState, FetchPolicy, MAX_FETCH_RETRIES, PAGE_LIMIT, RETRY_DELAY};
pub use image_url::normalize_image_url;
pub use normalize::normalize_card_row;
pub use source::{CardSource, SupabaseSource};

// src/utils/url.rs

//! URL construction for the puzzle endpoint and the data store.

use chrono::NaiveDate;
use url::Url;

use crate::error::Result;
use crate::utils::date::format_iso_date;

/// URL of the JSON payload for one date: `{endpoint}/{date}.json`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use xword_ingest::utils::url::puzzle_json_url;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// assert_eq!(
///     puzzle_json_url("https://puzzles.example/api/daily/", date),
///     "https://puzzles.example/api/daily/2024-03-01.json"
/// );
/// ```
pub fn puzzle_json_url(endpoint: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}.json",
        endpoint.trim_end_matches('/'),
        format_iso_date(date)
    )
}

/// Fill a public puzzle link template.
///
/// Supported placeholders: `{date}`, `{id}`. A missing id renders as empty.
pub fn render_puzzle_url(template: &str, date: NaiveDate, id: Option<&str>) -> String {
    template
        .replace("{date}", &format_iso_date(date))
        .replace("{id}", id.unwrap_or(""))
}

/// Join REST path segments onto the store base URL.
///
/// # Examples
/// ```
/// use xword_ingest::utils::url::rest_url;
///
/// let url = rest_url("https://store.example/", &["rest", "v1", "rpc", "promote"]).unwrap();
/// assert_eq!(url.as_str(), "https://store.example/rest/v1/rpc/promote");
/// ```
pub fn rest_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

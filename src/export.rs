//! CSV export of the review table.

use chrono::NaiveDate;

use crate::model::Review;

/// UTF-8 byte order mark, so spreadsheet tools pick the right encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADER: [&str; 6] = [
    "username",
    "content",
    "rating",
    "timestamp",
    "country",
    "country_code",
];

/// Serialize `reviews` as a BOM-prefixed CSV document.
pub fn write_csv(reviews: &[&Review]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());

    writer.write_record(HEADER)?;
    for review in reviews {
        let rating = review.rating.to_string();
        let timestamp = review.timestamp.to_rfc3339();
        writer.write_record([
            review.username.as_str(),
            review.content.as_str(),
            rating.as_str(),
            timestamp.as_str(),
            review.country.as_str(),
            review.country_code.as_str(),
        ])?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Download name for an export made on `date`, e.g. `racing_kingdom_reviews_20240131.csv`.
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_reviews_{}.csv", prefix, date.format("%Y%m%d"))
}

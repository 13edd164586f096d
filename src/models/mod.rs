pub mod record;
pub mod scrape_result;
pub mod source;

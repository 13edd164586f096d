/// One normalized job posting.
///
/// All five fields are always present; a field the source could not provide
/// is empty rather than absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub summary: String,
    /// Absolute URL of the posting's detail page, empty when the item had none.
    pub link: String,
    /// Required skills in source order, as scraped.
    pub tech_stack: Vec<String>,
}


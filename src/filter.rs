//! Row selection by product id, date range and keyword.

use crate::types::{DateRange, Record};

/// Text fields a keyword can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Sku,
    Name,
    Title,
}

impl SearchField {
    pub const DEFAULT: [SearchField; 3] = [SearchField::Sku, SearchField::Name, SearchField::Title];

    fn text(self, record: &Record) -> Option<&str> {
        match self {
            SearchField::Sku => record.sku.as_deref(),
            SearchField::Name => record.name.as_deref(),
            SearchField::Title => record.title.as_deref(),
        }
    }
}

/// All set criteria must hold; an unset criterion does not restrict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub product_id: Option<String>,
    pub date_range: Option<DateRange>,
    pub keyword: Option<String>,
}

impl FilterCriteria {
    pub fn with_product_id(mut self, id: impl Into<String>) -> Self {
        self.product_id = Some(id.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Lower-cased, trimmed keyword; blank input means no keyword.
    fn normalized_keyword(&self) -> Option<String> {
        let k = self.keyword.as_deref()?.trim();
        if k.is_empty() {
            None
        } else {
            Some(k.to_lowercase())
        }
    }

    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        self.apply_with_fields(records, &SearchField::DEFAULT)
    }

    /// Filter keeping source order. The result may be empty.
    pub fn apply_with_fields<'a>(
        &self,
        records: &'a [Record],
        fields: &[SearchField],
    ) -> Vec<&'a Record> {
        let keyword = self.normalized_keyword();
        records
            .iter()
            .filter(|r| {
                self.product_id
                    .as_deref()
                    .map_or(true, |id| r.product_id.as_deref() == Some(id))
            })
            .filter(|r| self.date_range.map_or(true, |range| range.contains(r.date)))
            .filter(|r| {
                keyword
                    .as_deref()
                    .map_or(true, |k| matches_keyword(r, fields, k))
            })
            .collect()
    }
}

fn matches_keyword(record: &Record, fields: &[SearchField], keyword: &str) -> bool {
    fields.iter().any(|f| {
        f.text(record)
            .map_or(false, |text| text.to_lowercase().contains(keyword))
    })
}

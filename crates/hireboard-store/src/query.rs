//! Job search query building and pagination.
//!
//! Translates the optional search filters into a single conjunctive filter
//! document and carries the skip/limit/total-pages arithmetic. Execution
//! lives in [`crate::jobs::JobRepository`].

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};

use hireboard_models::JobType;

/// Default page number when none is supplied.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when none is supplied.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Optional search filters. Absence of a field means "no constraint";
/// supplied predicates are ANDed across fields.
#[derive(Debug, Clone, Default)]
pub struct JobFilters {
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
    /// Case-insensitive substring match on the location.
    pub location: Option<String>,
    /// Membership match: the posting's type must be one of these.
    pub job_types: Vec<JobType>,
    /// Inclusive lower salary bound.
    pub min_salary: Option<i64>,
    /// Inclusive upper salary bound.
    pub max_salary: Option<i64>,
    /// Postings created at or after this instant.
    pub start_date: Option<DateTime<Utc>>,
}

impl JobFilters {
    /// True when no predicate is supplied (plain listing mode).
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.job_types.is_empty()
            && self.min_salary.is_none()
            && self.max_salary.is_none()
            && self.start_date.is_none()
    }

    /// Build the conjunctive filter document.
    ///
    /// User input for substring matches is regex-escaped so it is matched
    /// literally.
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();

        if let Some(ref title) = self.title {
            filter.insert("title", case_insensitive_substring(title));
        }

        if let Some(ref location) = self.location {
            filter.insert("location", case_insensitive_substring(location));
        }

        if !self.job_types.is_empty() {
            let types: Vec<Bson> = self
                .job_types
                .iter()
                .map(|t| Bson::String(t.as_str().to_string()))
                .collect();
            filter.insert("job_type", doc! { "$in": types });
        }

        if self.min_salary.is_some() || self.max_salary.is_some() {
            let mut range = Document::new();
            if let Some(min) = self.min_salary {
                range.insert("$gte", min);
            }
            if let Some(max) = self.max_salary {
                range.insert("$lte", max);
            }
            filter.insert("salary", range);
        }

        if let Some(start) = self.start_date {
            filter.insert(
                "created_at",
                doc! { "$gte": bson::DateTime::from_chrono(start) },
            );
        }

        filter
    }
}

fn case_insensitive_substring(input: &str) -> Bson {
    Bson::RegularExpression(bson::Regex {
        pattern: regex::escape(input),
        options: "i".to_string(),
    })
}

/// Normalized pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Normalize raw parameters: page and size are clamped to at least 1,
    /// size is capped at [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Records to skip: `(page - 1) * size`.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// One page of results plus total-count pagination metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Count of all matching records ignoring pagination.
    pub total: u64,
    pub page: u32,
    /// `ceil(total / size)`.
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            pages: total_pages(total, request.size),
        }
    }

    /// Map the items while keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            pages: self.pages,
        }
    }
}

/// `ceil(total / size)`. Zero matches means zero pages.
pub fn total_pages(total: u64, size: u32) -> u32 {
    let size = u64::from(size.max(1));
    total.div_ceil(size) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_filters_build_empty_document() {
        let filters = JobFilters::default();
        assert!(filters.is_empty());
        assert_eq!(filters.to_document(), Document::new());
    }

    #[test]
    fn title_filter_is_case_insensitive_and_escaped() {
        let filters = JobFilters {
            title: Some("c++ (senior)".to_string()),
            ..Default::default()
        };
        let doc = filters.to_document();
        match doc.get("title") {
            Some(Bson::RegularExpression(re)) => {
                assert_eq!(re.options, "i");
                // Metacharacters must be matched literally.
                assert_eq!(re.pattern, regex::escape("c++ (senior)"));
            }
            other => panic!("expected regex filter, got {:?}", other),
        }
    }

    #[test]
    fn job_types_are_ored_within_the_field() {
        let filters = JobFilters {
            job_types: vec![JobType::FullTime, JobType::Internship],
            ..Default::default()
        };
        let doc = filters.to_document();
        let expected = doc! { "job_type": { "$in": ["Full-time", "Internship"] } };
        assert_eq!(doc, expected);
    }

    #[test]
    fn salary_bounds_are_independent_and_inclusive() {
        let both = JobFilters {
            min_salary: Some(40_000),
            max_salary: Some(60_000),
            ..Default::default()
        };
        assert_eq!(
            both.to_document(),
            doc! { "salary": { "$gte": 40_000i64, "$lte": 60_000i64 } }
        );

        let only_min = JobFilters {
            min_salary: Some(60_000),
            ..Default::default()
        };
        assert_eq!(
            only_min.to_document(),
            doc! { "salary": { "$gte": 60_000i64 } }
        );

        let only_max = JobFilters {
            max_salary: Some(50_000),
            ..Default::default()
        };
        assert_eq!(
            only_max.to_document(),
            doc! { "salary": { "$lte": 50_000i64 } }
        );
    }

    #[test]
    fn start_date_filters_on_created_at() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filters = JobFilters {
            start_date: Some(start),
            ..Default::default()
        };
        let doc = filters.to_document();
        assert_eq!(
            doc.get_document("created_at").unwrap().get("$gte"),
            Some(&Bson::DateTime(bson::DateTime::from_chrono(start)))
        );
    }

    #[test]
    fn predicates_are_conjunctive() {
        let filters = JobFilters {
            title: Some("engineer".to_string()),
            location: Some("berlin".to_string()),
            job_types: vec![JobType::FullTime],
            min_salary: Some(80_000),
            max_salary: None,
            start_date: None,
        };
        let doc = filters.to_document();
        // One top-level entry per supplied field, no $or anywhere.
        assert_eq!(doc.len(), 4);
        assert!(!doc.contains_key("$or"));
    }

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, size: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, size: 1 });
        assert_eq!(
            PageRequest::new(Some(3), Some(500)),
            PageRequest {
                page: 3,
                size: MAX_PAGE_SIZE
            }
        );
    }

    #[test]
    fn skip_is_page_minus_one_times_size() {
        assert_eq!(PageRequest::new(Some(1), Some(10)).skip(), 0);
        assert_eq!(PageRequest::new(Some(2), Some(10)).skip(), 10);
        assert_eq!(PageRequest::new(Some(7), Some(25)).skip(), 150);
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(100, 7), 15);
    }

    #[test]
    fn out_of_range_page_keeps_metadata_shape() {
        // An out-of-range page produces an empty page with correct totals,
        // never an error.
        let request = PageRequest::new(Some(9), Some(10));
        let page: Page<u32> = Page::new(Vec::new(), 11, request);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 11);
        assert_eq!(page.pages, 2);
        assert_eq!(page.page, 9);
    }
}
